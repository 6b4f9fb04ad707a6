//! Level extraction
//!
//! Derives the named levels from the aggregated curve plus the raw
//! contributions (walls need per-side data). IV extremes come from a
//! per-strike IV series built over the unfiltered chain.
//!
//! Every level whose sub-population is empty comes out absent. Ties always
//! resolve to the lowest strike, since every series here is strike-ascending.

use crate::core::{OptionContract, OptionSide};
use crate::exposure::{aggregate, sum_by_strike, GexContribution, StrikeGexCurve};

use super::{LevelConfig, LevelKind, LevelSet, WallBasis};

/// Strike whose key is largest; first one wins on ties. Non-finite keys are skipped.
fn argmax_by<F>(series: &[(f64, f64)], key: F) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let mut best: Option<(f64, f64)> = None;
    for &(strike, value) in series {
        let k = key(value);
        if !k.is_finite() {
            continue;
        }
        match best {
            Some((_, best_k)) if k <= best_k => {}
            _ => best = Some((strike, k)),
        }
    }
    best.map(|(strike, _)| strike)
}

/// Strike whose key is smallest; first one wins on ties
fn argmin_by<F>(series: &[(f64, f64)], key: F) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    argmax_by(series, |v| -key(v))
}

/// Wall strike for one side, optionally restricted to 0DTE rows
fn wall(
    contributions: &[GexContribution],
    side: OptionSide,
    zero_dte_only: bool,
    basis: WallBasis,
) -> Option<f64> {
    let rows = contributions
        .iter()
        .filter(|c| c.side == side && (!zero_dte_only || c.zero_dte));

    let series = match basis {
        WallBasis::Gex => sum_by_strike(rows.map(|c| (c.strike, c.signed_gex))),
        WallBasis::OpenInterest => sum_by_strike(rows.map(|c| (c.strike, c.open_interest as f64))),
    };

    // Only strikes that carry exposure on the wall's side qualify
    let series: Vec<(f64, f64)> = match (basis, side) {
        (WallBasis::Gex, OptionSide::Put) => series.into_iter().filter(|&(_, v)| v < 0.0).collect(),
        _ => series.into_iter().filter(|&(_, v)| v > 0.0).collect(),
    };

    match (basis, side) {
        (WallBasis::Gex, OptionSide::Put) => argmin_by(&series, |v| v),
        _ => argmax_by(&series, |v| v),
    }
}

/// Strike where |cumulative GEX| is smallest
pub fn gamma_flip(curve: &StrikeGexCurve) -> Option<f64> {
    let series: Vec<(f64, f64)> = curve
        .points()
        .iter()
        .map(|p| (p.strike, p.cumulative_gex))
        .collect();
    argmin_by(&series, f64::abs)
}

/// Up to `n` strikes ordered by descending |GEX|; strikes with no exposure never rank
pub fn high_gamma_strikes(curve: &StrikeGexCurve, n: usize) -> Vec<f64> {
    let mut ranked: Vec<(f64, f64)> = curve
        .points()
        .iter()
        .filter(|p| p.gex.is_finite() && p.gex != 0.0)
        .map(|p| (p.strike, p.gex.abs()))
        .collect();

    // Stable: equal magnitudes keep ascending strike order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(n).map(|(strike, _)| strike).collect()
}

/// Mean implied vol per strike over `(strike, iv)` quotes, both sides pooled.
///
/// Quotes with a missing, non-finite or non-positive vol are ignored.
pub fn mean_iv_by_strike(quotes: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    let with_iv: Vec<(f64, f64)> = quotes
        .into_iter()
        .filter(|(_, iv)| iv.is_finite() && *iv > 0.0)
        .collect();

    let sums = sum_by_strike(with_iv.iter().copied());
    let counts = sum_by_strike(with_iv.iter().map(|&(k, _)| (k, 1.0)));

    sums.into_iter()
        .zip(counts)
        .map(|((strike, sum), (_, n))| (strike, sum / n))
        .collect()
}

/// Mean IV per strike over raw chain rows, open interest or not
pub fn contract_iv_by_strike<'a>(
    contracts: impl IntoIterator<Item = &'a OptionContract>,
) -> Vec<(f64, f64)> {
    mean_iv_by_strike(
        contracts
            .into_iter()
            .filter_map(|c| c.implied_vol.map(|iv| (c.strike, iv))),
    )
}

/// Mean IV per strike over contributions that carried a usable vol
pub fn contribution_iv_by_strike(contributions: &[GexContribution]) -> Vec<(f64, f64)> {
    mean_iv_by_strike(
        contributions
            .iter()
            .filter_map(|c| c.implied_vol.map(|iv| (c.strike, iv))),
    )
}

/// Gamma flip of the same-day sub-curve; absent when no 0DTE row carries exposure
fn zero_dte_flip(contributions: &[GexContribution]) -> Option<f64> {
    let zero_dte: Vec<GexContribution> = contributions
        .iter()
        .filter(|c| c.zero_dte)
        .cloned()
        .collect();

    if zero_dte.iter().all(|c| c.signed_gex == 0.0) {
        return None;
    }
    gamma_flip(&aggregate(&zero_dte))
}

/// Extract every named level for `ticker`
///
/// `iv_by_strike` is the mean IV per strike (see `contract_iv_by_strike`),
/// taken over the chain before inert rows are dropped.
pub fn extract_levels(
    curve: &StrikeGexCurve,
    contributions: &[GexContribution],
    iv_by_strike: &[(f64, f64)],
    ticker: &str,
    config: &LevelConfig,
) -> LevelSet {
    let mut levels = LevelSet::new();
    let basis = config.wall_basis;

    levels.insert(
        LevelKind::PutWall.key(ticker),
        wall(contributions, OptionSide::Put, false, basis),
    );
    levels.insert(
        LevelKind::CallWall.key(ticker),
        wall(contributions, OptionSide::Call, false, basis),
    );
    levels.insert(
        LevelKind::PutWall0Dte.key(ticker),
        wall(contributions, OptionSide::Put, true, basis),
    );
    levels.insert(
        LevelKind::CallWall0Dte.key(ticker),
        wall(contributions, OptionSide::Call, true, basis),
    );

    let net: Vec<(f64, f64)> = curve.points().iter().map(|p| (p.strike, p.gex)).collect();
    levels.insert(LevelKind::MaxGamma.key(ticker), argmax_by(&net, f64::abs));
    levels.insert(LevelKind::MinGamma.key(ticker), argmin_by(&net, f64::abs));

    levels.insert(LevelKind::GammaFlip.key(ticker), gamma_flip(curve));

    levels.insert(LevelKind::GammaFlip0Dte.key(ticker), zero_dte_flip(contributions));

    levels.insert(LevelKind::MaxIv.key(ticker), argmax_by(iv_by_strike, |v| v));
    levels.insert(LevelKind::MinIv.key(ticker), argmin_by(iv_by_strike, |v| v));

    let high = high_gamma_strikes(curve, config.top_n);
    for rank in 0..config.top_n {
        levels.insert(
            LevelKind::HighGamma(rank + 1).key(ticker),
            high.get(rank).copied(),
        );
    }

    tracing::debug!(
        ticker,
        present = levels.len(),
        strikes = curve.len(),
        "extracted levels"
    );
    levels
}

/// Level extraction with a fixed configuration
pub struct LevelExtractor {
    config: LevelConfig,
}

impl LevelExtractor {
    pub fn new() -> Self {
        Self {
            config: LevelConfig::default(),
        }
    }

    pub fn with_config(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Aggregate and extract in one step.
    ///
    /// IV extremes here only see the contributions passed in.
    pub fn extract(&self, contributions: &[GexContribution], ticker: &str) -> (StrikeGexCurve, LevelSet) {
        let curve = aggregate(contributions);
        let iv = contribution_iv_by_strike(contributions);
        let levels = extract_levels(&curve, contributions, &iv, ticker, &self.config);
        (curve, levels)
    }
}

impl Default for LevelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionContract;
    use crate::exposure::{ContractFilter, ExposureModel};
    use chrono::NaiveDate;

    fn row(strike: f64, side: OptionSide, gex: f64) -> GexContribution {
        GexContribution {
            strike,
            signed_gex: gex,
            side,
            zero_dte: false,
            implied_vol: Some(0.2),
            open_interest: 10,
        }
    }

    fn zero_dte(mut c: GexContribution) -> GexContribution {
        c.zero_dte = true;
        c
    }

    fn levels_of(contributions: &[GexContribution]) -> LevelSet {
        LevelExtractor::new().extract(contributions, "QQQ").1
    }

    #[test]
    fn test_wall_selection() {
        let contributions = vec![
            row(95.0, OptionSide::Call, 50.0),
            row(105.0, OptionSide::Call, 30.0),
            row(100.0, OptionSide::Put, -80.0),
        ];
        let levels = levels_of(&contributions);

        assert_eq!(levels.get("QQQ Call Wall"), Some(95.0));
        assert_eq!(levels.get("QQQ Put Wall"), Some(100.0));
        assert_eq!(levels.get("QQQ Max Gamma"), Some(100.0));
        assert_eq!(levels.get("QQQ Min Gamma"), Some(105.0));
        // cumulative: 50, -30, 0
        assert_eq!(levels.get("QQQ Gamma Flip"), Some(105.0));

        assert_eq!(levels.get("QQQ High Gamma-1"), Some(100.0));
        assert_eq!(levels.get("QQQ High Gamma-2"), Some(95.0));
        assert_eq!(levels.get("QQQ High Gamma-3"), Some(105.0));
        assert!(!levels.contains("QQQ High Gamma-4"));
    }

    #[test]
    fn test_flat_curve_single_strike() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let expiry = as_of + chrono::Duration::days(10);
        let contracts = vec![
            OptionContract::call(100.0, expiry, 0.2, 10),
            OptionContract::put(100.0, expiry, 0.2, 10),
        ];

        // 10 days on a 100-day basis gives T = 0.1
        let model = ExposureModel::new(0.05).with_days_per_year(100.0);
        let contributions = model
            .contributions(&contracts, 100.0, as_of, &ContractFilter::default())
            .unwrap();
        let (curve, levels) = LevelExtractor::new().extract(&contributions, "QQQ");

        assert_eq!(curve.len(), 1);
        assert_eq!(levels.get("QQQ Call Wall"), Some(100.0));
        assert_eq!(levels.get("QQQ Put Wall"), Some(100.0));
        assert_eq!(levels.get("QQQ Gamma Flip"), Some(100.0));
        assert_eq!(levels.get("QQQ Max Gamma"), Some(100.0));
    }

    #[test]
    fn test_no_puts_means_no_put_walls() {
        let contributions = vec![
            row(100.0, OptionSide::Call, 10.0),
            zero_dte(row(101.0, OptionSide::Call, 5.0)),
        ];
        let levels = levels_of(&contributions);

        assert!(!levels.contains("QQQ Put Wall"));
        assert!(!levels.contains("QQQ Put Wall 0DTE"));
        assert_eq!(levels.get("QQQ Call Wall 0DTE"), Some(101.0));

        let json = serde_json::to_string(&levels).unwrap();
        assert!(!json.contains("Put Wall"));
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_empty_batch_is_all_absent() {
        let levels = levels_of(&[]);
        assert!(levels.is_empty());
        assert_eq!(serde_json::to_string(&levels).unwrap(), "{}");
    }

    #[test]
    fn test_zero_dte_walls() {
        let contributions = vec![
            row(100.0, OptionSide::Call, 40.0),
            row(90.0, OptionSide::Put, -60.0),
            zero_dte(row(102.0, OptionSide::Call, 15.0)),
            zero_dte(row(103.0, OptionSide::Call, 25.0)),
            zero_dte(row(97.0, OptionSide::Put, -5.0)),
            zero_dte(row(98.0, OptionSide::Put, -3.0)),
        ];
        let levels = levels_of(&contributions);

        assert_eq!(levels.get("QQQ Call Wall"), Some(100.0));
        assert_eq!(levels.get("QQQ Put Wall"), Some(90.0));
        assert_eq!(levels.get("QQQ Call Wall 0DTE"), Some(103.0));
        assert_eq!(levels.get("QQQ Put Wall 0DTE"), Some(97.0));
        // 0DTE cumulative: -5, -8, 7, 32
        assert_eq!(levels.get("QQQ Gamma Flip 0DTE"), Some(97.0));
    }

    #[test]
    fn test_zero_exposure_walls_are_absent() {
        // Same-day expiries carry no gamma on a whole-day clock
        let contributions = vec![
            row(100.0, OptionSide::Call, 40.0),
            zero_dte(row(101.0, OptionSide::Call, 0.0)),
            zero_dte(row(99.0, OptionSide::Put, 0.0)),
        ];
        let levels = levels_of(&contributions);

        assert!(!levels.contains("QQQ Call Wall 0DTE"));
        assert!(!levels.contains("QQQ Put Wall 0DTE"));
        assert!(!levels.contains("QQQ Gamma Flip 0DTE"));

        // Zero-exposure strikes never take a High Gamma slot
        assert_eq!(levels.get("QQQ High Gamma-1"), Some(100.0));
        assert!(!levels.contains("QQQ High Gamma-2"));
    }

    #[test]
    fn test_zero_dte_flip_absent_on_whole_day_clock() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let weekly = as_of + chrono::Duration::days(4);
        let contracts = vec![
            OptionContract::put(450.0, as_of, 0.4, 2000),
            OptionContract::put(598.0, as_of, 0.2, 5000),
            OptionContract::call(600.0, as_of, 0.2, 5000),
            OptionContract::call(610.0, weekly, 0.2, 3000),
        ];

        let contributions = ExposureModel::new(0.05)
            .contributions(&contracts, 600.0, as_of, &ContractFilter::default())
            .unwrap();
        assert_eq!(contributions.iter().filter(|c| c.zero_dte).count(), 3);

        let levels = levels_of(&contributions);
        assert!(!levels.contains("QQQ Gamma Flip 0DTE"));
        assert_eq!(levels.get("QQQ High Gamma-1"), Some(610.0));
        assert!(!levels.contains("QQQ High Gamma-2"));
        assert!(!levels.contains("QQQ High Gamma-4"));
    }

    #[test]
    fn test_iv_extremes_ignore_inert_filter() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let expiry = as_of + chrono::Duration::days(10);
        let contracts = vec![
            OptionContract::call(100.0, expiry, 0.20, 50),
            OptionContract::put(95.0, expiry, 0.25, 50),
            OptionContract::call(120.0, expiry, 0.90, 0),
        ];
        let model = ExposureModel::new(0.05);
        let iv = contract_iv_by_strike(&contracts);

        let mut results = Vec::new();
        for filter in [ContractFilter::default(), ContractFilter::none()] {
            let contributions = model.contributions(&contracts, 100.0, as_of, &filter).unwrap();
            let curve = aggregate(&contributions);
            let levels = extract_levels(&curve, &contributions, &iv, "QQQ", &LevelConfig::default());
            results.push((levels.get("QQQ Max IV"), levels.get("QQQ Min IV")));
        }

        assert_eq!(results[0], (Some(120.0), Some(100.0)));
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn test_open_interest_walls() {
        let mut big_put = row(95.0, OptionSide::Put, -1.0);
        big_put.open_interest = 5000;
        let mut big_call = row(110.0, OptionSide::Call, 1.0);
        big_call.open_interest = 7000;
        let contributions = vec![
            row(100.0, OptionSide::Call, 90.0),
            row(100.0, OptionSide::Put, -90.0),
            big_put,
            big_call,
        ];

        let gex_levels = levels_of(&contributions);
        assert_eq!(gex_levels.get("QQQ Call Wall"), Some(100.0));
        assert_eq!(gex_levels.get("QQQ Put Wall"), Some(100.0));

        let oi_levels = LevelExtractor::with_config(LevelConfig::open_interest_walls())
            .extract(&contributions, "QQQ")
            .1;
        assert_eq!(oi_levels.get("QQQ Call Wall"), Some(110.0));
        assert_eq!(oi_levels.get("QQQ Put Wall"), Some(95.0));
    }

    #[test]
    fn test_gamma_flip_tie_takes_lowest_strike() {
        // cumulative: 10, 0, 10, 0
        let contributions = vec![
            row(100.0, OptionSide::Call, 10.0),
            row(101.0, OptionSide::Put, -10.0),
            row(102.0, OptionSide::Call, 10.0),
            row(103.0, OptionSide::Put, -10.0),
        ];
        let curve = aggregate(&contributions);
        assert_eq!(gamma_flip(&curve), Some(101.0));
    }

    #[test]
    fn test_top_n_configurable() {
        let contributions: Vec<GexContribution> = (0..6)
            .map(|i| row(100.0 + i as f64, OptionSide::Call, (i + 1) as f64))
            .collect();

        let levels = LevelExtractor::with_config(LevelConfig::legacy_top2())
            .extract(&contributions, "QQQ")
            .1;

        assert_eq!(levels.get("QQQ High Gamma-1"), Some(105.0));
        assert_eq!(levels.get("QQQ High Gamma-2"), Some(104.0));
        assert!(levels.iter().all(|(k, _)| k != "QQQ High Gamma-3"));
    }

    #[test]
    fn test_iv_extremes_pool_both_sides() {
        let mut a = row(100.0, OptionSide::Call, 1.0);
        a.implied_vol = Some(0.10);
        let mut b = row(100.0, OptionSide::Put, -1.0);
        b.implied_vol = Some(0.50);
        let mut c = row(105.0, OptionSide::Call, 1.0);
        c.implied_vol = Some(0.25);
        let mut d = row(110.0, OptionSide::Call, 1.0);
        d.implied_vol = None;

        let iv = contribution_iv_by_strike(&[a.clone(), b.clone(), c.clone(), d.clone()]);
        assert_eq!(iv.len(), 2);
        assert!((iv[0].1 - 0.30).abs() < 1e-12);

        let levels = levels_of(&[a, b, c, d]);
        assert_eq!(levels.get("QQQ Max IV"), Some(100.0));
        assert_eq!(levels.get("QQQ Min IV"), Some(105.0));
    }

    #[test]
    fn test_levels_are_rounded() {
        let contributions = vec![row(612.3456, OptionSide::Call, 3.0)];
        let levels = levels_of(&contributions);
        assert_eq!(levels.get("QQQ Call Wall"), Some(612.35));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let contributions: Vec<GexContribution> = (0..40)
            .map(|i| {
                let side = if i % 3 == 0 { OptionSide::Put } else { OptionSide::Call };
                row(90.0 + (i % 13) as f64, side, side.sign() * (1.0 + (i * 7 % 11) as f64))
            })
            .collect();

        assert_eq!(levels_of(&contributions), levels_of(&contributions));
    }
}
