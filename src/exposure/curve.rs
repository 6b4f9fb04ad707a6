//! Strike aggregation
//!
//! Sums per-contract exposure into one point per distinct strike, ascending,
//! with a running cumulative sum in strike order.

use serde::{Deserialize, Serialize};

use super::GexContribution;

/// One strike on the aggregated curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikePoint {
    pub strike: f64,
    /// Net GEX at this strike (calls + puts)
    pub gex: f64,
    /// Sum of `gex` over this and every lower strike
    pub cumulative_gex: f64,
}

/// Net GEX by strike, strictly increasing in strike
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrikeGexCurve {
    points: Vec<StrikePoint>,
}

impl StrikeGexCurve {
    pub fn points(&self) -> &[StrikePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn strikes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strike).collect()
    }

    /// Net exposure across all strikes (last cumulative value)
    pub fn total_gex(&self) -> f64 {
        self.points.last().map(|p| p.cumulative_gex).unwrap_or(0.0)
    }

    /// Point at an exact strike
    pub fn at(&self, strike: f64) -> Option<&StrikePoint> {
        self.points
            .binary_search_by(|p| p.strike.total_cmp(&strike))
            .ok()
            .map(|i| &self.points[i])
    }
}

/// Group `(strike, value)` pairs by exact strike and sum, ascending by strike.
///
/// Non-finite strikes cannot be ordered and are skipped.
pub fn sum_by_strike(pairs: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = pairs.into_iter().filter(|(k, _)| k.is_finite()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut grouped: Vec<(f64, f64)> = Vec::with_capacity(pairs.len());
    for (strike, value) in pairs {
        match grouped.last_mut() {
            Some((last, sum)) if *last == strike => *sum += value,
            _ => grouped.push((strike, value)),
        }
    }
    grouped
}

/// Build the strike curve from a full batch of contributions.
///
/// Empty input yields an empty curve.
pub fn aggregate(contributions: &[GexContribution]) -> StrikeGexCurve {
    let grouped = sum_by_strike(contributions.iter().map(|c| (c.strike, c.signed_gex)));

    let mut running = 0.0;
    let points: Vec<StrikePoint> = grouped
        .into_iter()
        .map(|(strike, gex)| {
            running += gex;
            StrikePoint {
                strike,
                gex,
                cumulative_gex: running,
            }
        })
        .collect();

    tracing::debug!(strikes = points.len(), net_gex = running, "aggregated strike curve");
    StrikeGexCurve { points }
}
