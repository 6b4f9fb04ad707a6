//! Chain snapshot
//!
//! The fully materialized batch of contract rows for one evaluation cycle.
//! Aggregation runs a global group-by over the whole batch, so every
//! expiration must be collected here before any GEX is computed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::option::{OptionContract, OptionSide};

/// All contract rows for one underlying at one evaluation date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Underlying symbol (e.g., "QQQ")
    pub underlying: String,
    /// Underlying spot price
    pub spot: f64,
    /// Evaluation date; contracts expiring on it are 0DTE
    pub as_of: NaiveDate,
    /// Every call and put across all expirations
    pub contracts: Vec<OptionContract>,
}

impl ChainSnapshot {
    pub fn new(underlying: impl Into<String>, spot: f64, as_of: NaiveDate) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            as_of,
            contracts: Vec::new(),
        }
    }

    pub fn with_contracts(mut self, contracts: impl IntoIterator<Item = OptionContract>) -> Self {
        self.contracts.extend(contracts);
        self
    }

    pub fn add_contract(&mut self, contract: OptionContract) {
        self.contracts.push(contract);
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn calls(&self) -> impl Iterator<Item = &OptionContract> {
        self.contracts.iter().filter(|c| c.side == OptionSide::Call)
    }

    pub fn puts(&self) -> impl Iterator<Item = &OptionContract> {
        self.contracts.iter().filter(|c| c.side == OptionSide::Put)
    }

    /// Contracts expiring on the evaluation date
    pub fn zero_dte(&self) -> impl Iterator<Item = &OptionContract> {
        let as_of = self.as_of;
        self.contracts.iter().filter(move |c| c.is_zero_dte(as_of))
    }

    /// Distinct expirations, ascending
    pub fn expiries(&self) -> Vec<NaiveDate> {
        let mut expiries: Vec<NaiveDate> = self.contracts.iter().map(|c| c.expiry).collect();
        expiries.sort();
        expiries.dedup();
        expiries
    }

    /// Distinct strikes, ascending
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self.contracts.iter().map(|c| c.strike).collect();
        strikes.sort_by(|a, b| a.total_cmp(b));
        strikes.dedup();
        strikes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_views() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let weekly = NaiveDate::from_ymd_opt(2025, 1, 24).unwrap();

        let snapshot = ChainSnapshot::new("QQQ", 500.0, today).with_contracts([
            OptionContract::call(505.0, weekly, 0.18, 100),
            OptionContract::put(495.0, today, 0.22, 80),
            OptionContract::call(500.0, today, 0.20, 120),
            OptionContract::put(500.0, weekly, 0.21, 90),
        ]);

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.calls().count(), 2);
        assert_eq!(snapshot.puts().count(), 2);
        assert_eq!(snapshot.zero_dte().count(), 2);
        assert_eq!(snapshot.expiries(), vec![today, weekly]);
        assert_eq!(snapshot.strikes(), vec![495.0, 500.0, 505.0]);
    }

    #[test]
    fn test_snapshot_json() {
        let json = r#"{
            "underlying": "QQQ",
            "spot": 600.0,
            "as_of": "2025-01-20",
            "contracts": [
                {"strike": 630.0, "side": "call", "expiry": "2025-01-24", "implied_vol": 0.19, "open_interest": 1500}
            ]
        }"#;
        let snapshot: ChainSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.underlying, "QQQ");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.contracts[0].open_interest, 1500);
    }
}
