//! GEX engine
//!
//! Runs the full pipeline for one evaluation cycle:
//! contract rows → per-contract GEX → strike curve → named levels →
//! projected levels → merged report.
//!
//! Each run is independent; the engine only holds its configuration.

mod config;
mod report;

pub use config::*;
pub use report::*;

use chrono::NaiveDate;

use crate::core::{ChainSnapshot, GexError, GexResult};
use crate::data::MarketDataSource;
use crate::exposure::{aggregate, ContractFilter};
use crate::levels::{contract_iv_by_strike, extract_levels};

/// Main facade for the GEX pipeline
pub struct GexEngine {
    config: EngineConfig,
}

impl GexEngine {
    /// Create an engine; the configuration is validated up front
    pub fn new(config: EngineConfig) -> GexResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute levels for an already collected batch
    ///
    /// # Arguments
    /// * `snapshot` - Every contract row for the cycle, plus source spot
    /// * `target_spot` - Live price of the projected instrument, if known
    /// * `generated_at` - Freshness stamp written alongside the levels
    pub fn compute(
        &self,
        snapshot: &ChainSnapshot,
        target_spot: Option<f64>,
        generated_at: impl Into<String>,
    ) -> GexResult<LevelReport> {
        let spot = snapshot.spot;
        if !spot.is_finite() || spot <= 0.0 {
            return Err(GexError::invalid_input(format!(
                "{} spot must be positive and finite, got {}",
                snapshot.underlying, spot
            )));
        }
        if snapshot.underlying != self.config.source_ticker {
            tracing::warn!(
                snapshot = %snapshot.underlying,
                configured = %self.config.source_ticker,
                "snapshot underlying differs from configured source ticker"
            );
        }

        let contributions = self.config.exposure_model().contributions(
            &snapshot.contracts,
            spot,
            snapshot.as_of,
            &self.config.filter,
        )?;

        // IV extremes see every quoted row inside the strike band, OI or not
        let band = ContractFilter {
            drop_inert: false,
            ..self.config.filter.clone()
        };
        let iv = contract_iv_by_strike(snapshot.contracts.iter().filter(|c| band.admits(c, spot)));

        let curve = aggregate(&contributions);
        let source = extract_levels(
            &curve,
            &contributions,
            &iv,
            &self.config.source_ticker,
            &self.config.levels,
        );
        let projection = self.config.projector().apply(&source, spot, target_spot)?;

        tracing::info!(
            underlying = %self.config.source_ticker,
            spot,
            contracts = snapshot.len(),
            used = contributions.len(),
            strikes = curve.len(),
            net_gex = curve.total_gex(),
            ratio = projection.ratio,
            levels = source.len(),
            "computed GEX levels"
        );

        Ok(LevelReport {
            source,
            projected: projection.levels,
            generated_at: generated_at.into(),
            timestamp_key: self.config.timestamp_key.clone(),
            ratio: projection.ratio,
            used_fixed_ratio: projection.used_fixed,
            curve,
        })
    }

    /// Fetch a full snapshot from `source`, then compute
    ///
    /// A missing target price is not fatal; projection falls back to the
    /// fixed multiplier.
    pub fn run(&self, source: &dyn MarketDataSource, as_of: NaiveDate) -> GexResult<LevelReport> {
        let snapshot = source.snapshot(&self.config.source_ticker, as_of)?;

        let target_spot = match &self.config.target_quote_symbol {
            Some(symbol) => match source.spot(symbol) {
                Ok(price) => Some(price),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "could not fetch target price");
                    None
                }
            },
            None => None,
        };

        self.compute(&snapshot, target_spot, timestamp_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OptionContract, OptionSide};
    use crate::data::{ChainRows, InMemorySource};
    use crate::levels::{round2, LevelKind, ProjectionConfig};

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    fn sample_snapshot() -> ChainSnapshot {
        let weekly = as_of() + chrono::Duration::days(4);
        let monthly = as_of() + chrono::Duration::days(25);

        ChainSnapshot::new("QQQ", 600.0, as_of()).with_contracts([
            OptionContract::call(600.0, as_of(), 0.15, 9000),
            OptionContract::put(595.0, as_of(), 0.17, 8000),
            OptionContract::call(610.0, weekly, 0.16, 12000),
            OptionContract::call(620.0, weekly, 0.18, 4000),
            OptionContract::put(590.0, weekly, 0.21, 15000),
            OptionContract::put(580.0, weekly, 0.24, 6000),
            OptionContract::call(630.0, monthly, 0.17, 20000),
            OptionContract::put(570.0, monthly, 0.26, 18000),
            OptionContract::new(650.0, OptionSide::Call, monthly, None, 3000),
            OptionContract::call(700.0, monthly, 0.30, 0),
        ])
    }

    #[test]
    fn test_compute_pipeline() {
        let engine = GexEngine::new(EngineConfig::default()).unwrap();
        let report = engine
            .compute(&sample_snapshot(), Some(24000.0), "2025-01-20 10:00:00.000000")
            .unwrap();

        assert_eq!(report.ratio, 40.0);
        assert!(!report.used_fixed_ratio);
        assert!(report.source.contains("QQQ Call Wall"));
        assert!(report.source.contains("QQQ Put Wall"));
        assert!(report.source.contains("QQQ Gamma Flip"));

        // Same-day expiries carry no gamma on a whole-day clock
        assert!(!report.source.contains("QQQ Call Wall 0DTE"));
        assert!(!report.source.contains("QQQ Gamma Flip 0DTE"));
        assert!(!report.projected.contains("MNQ Gamma Flip 0DTE"));

        for (name, value) in report.source.present() {
            let projected = name.replacen("QQQ", "MNQ", 1);
            assert_eq!(report.projected.get(&projected), Some(round2(value * 40.0)));
        }

        // Inert rows (no IV at 650, no OI at 700) were filtered out
        assert!(report.curve.at(650.0).is_none());
        assert!(report.curve.at(700.0).is_none());
    }

    #[test]
    fn test_idempotent() {
        let engine = GexEngine::new(EngineConfig::default()).unwrap();
        let snapshot = sample_snapshot();

        let a = engine.compute(&snapshot, Some(24100.0), "t").unwrap();
        let b = engine.compute(&snapshot, Some(24100.0), "t").unwrap();

        assert_eq!(a.source, b.source);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_output_has_no_nulls() {
        let engine = GexEngine::new(EngineConfig::default()).unwrap();
        let calls_only = ChainSnapshot::new("QQQ", 600.0, as_of()).with_contracts([
            OptionContract::call(605.0, as_of() + chrono::Duration::days(3), 0.2, 500),
        ]);

        let report = engine.compute(&calls_only, None, "t").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let map = json.as_object().unwrap();

        assert!(!map.contains_key("QQQ Put Wall"));
        assert!(!map.contains_key("QQQ Put Wall 0DTE"));
        assert!(!map.contains_key("MNQ Put Wall"));
        assert!(map.values().all(|v| !v.is_null()));
        assert_eq!(map.get("Updated").and_then(|v| v.as_str()), Some("t"));
        assert!(report.used_fixed_ratio);
    }

    #[test]
    fn test_empty_snapshot_is_no_data_not_error() {
        let engine = GexEngine::new(EngineConfig::default()).unwrap();
        let empty = ChainSnapshot::new("QQQ", 600.0, as_of());

        let report = engine.compute(&empty, Some(24000.0), "t").unwrap();
        assert!(report.source.is_empty());
        assert!(report.projected.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_bad_spot_rejected() {
        let engine = GexEngine::new(EngineConfig::default()).unwrap();
        let zero = ChainSnapshot::new("QQQ", 0.0, as_of());
        assert!(engine.compute(&zero, None, "t").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.levels.top_n = 0;
        assert!(GexEngine::new(cfg).is_err());
    }

    #[test]
    fn test_strike_band_trims_curve() {
        let mut cfg = EngineConfig::default();
        cfg.filter.strike_band_percent = Some(0.02);
        let engine = GexEngine::new(cfg).unwrap();

        let report = engine.compute(&sample_snapshot(), None, "t").unwrap();
        assert!(report
            .curve
            .strikes()
            .iter()
            .all(|&k| (588.0..=612.0).contains(&k)));
    }

    #[test]
    fn test_iv_extremes_independent_of_inert_filter() {
        let expiry = as_of() + chrono::Duration::days(10);
        let snapshot = ChainSnapshot::new("QQQ", 100.0, as_of()).with_contracts([
            OptionContract::call(100.0, expiry, 0.20, 50),
            OptionContract::put(95.0, expiry, 0.25, 50),
            OptionContract::call(120.0, expiry, 0.90, 0),
        ]);

        let filtered = GexEngine::new(EngineConfig::default()).unwrap();
        let mut cfg = EngineConfig::default();
        cfg.filter = ContractFilter::none();
        let unfiltered = GexEngine::new(cfg).unwrap();

        let a = filtered.compute(&snapshot, None, "t").unwrap();
        let b = unfiltered.compute(&snapshot, None, "t").unwrap();

        assert_eq!(a.source.get("QQQ Max IV"), Some(120.0));
        assert_eq!(a.source.get("QQQ Min IV"), Some(100.0));
        assert_eq!(a.source.get("QQQ Max IV"), b.source.get("QQQ Max IV"));
        assert_eq!(a.source.get("QQQ Min IV"), b.source.get("QQQ Min IV"));
    }

    #[test]
    fn test_run_against_source() {
        let snapshot = sample_snapshot();
        let mut source = InMemorySource::new();
        source.set_spot("QQQ", snapshot.spot);
        source.set_spot("MNQ=F", 24300.0);
        for expiry in snapshot.expiries() {
            let rows: Vec<OptionContract> = snapshot
                .contracts
                .iter()
                .filter(|c| c.expiry == expiry)
                .cloned()
                .collect();
            source.set_chain("QQQ", expiry, ChainRows::from_contracts(rows));
        }

        let engine = GexEngine::new(EngineConfig::default()).unwrap();
        let report = engine.run(&source, as_of()).unwrap();
        let direct = engine.compute(&snapshot, Some(24300.0), "t").unwrap();

        assert!((report.ratio - 40.5).abs() < 1e-12);
        assert_eq!(report.source, direct.source);
        assert_eq!(report.projected, direct.projected);
    }

    #[test]
    fn test_fixed_projection_config() {
        let mut cfg = EngineConfig::default();
        cfg.projection = ProjectionConfig::fixed(4.0);
        let engine = GexEngine::new(cfg).unwrap();

        let report = engine.compute(&sample_snapshot(), Some(24000.0), "t").unwrap();
        assert!(report.used_fixed_ratio);

        let flip = report.source.level("QQQ", LevelKind::GammaFlip).unwrap();
        let projected = report.projected.level("MNQ", LevelKind::GammaFlip).unwrap();
        assert!((projected - flip * 4.0).abs() < 0.01);
    }
}
