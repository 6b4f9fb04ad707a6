//! Engine configuration
//!
//! Everything a computation run needs, passed in explicitly. Loadable from a
//! partial JSON document; missing fields take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{GexError, GexResult};
use crate::exposure::{ContractFilter, ExposureModel};
use crate::levels::{LevelConfig, LevelKind, ProjectionConfig, Projector};

/// Configuration for one GEX computation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Options underlying, used in level names
    /// Default: "QQQ"
    pub source_ticker: String,

    /// Instrument the levels are projected onto
    /// Default: "MNQ"
    pub target_ticker: String,

    /// Market data symbol for the target's live price
    /// Default: Some("MNQ=F")
    pub target_quote_symbol: Option<String>,

    /// Annualized risk-free rate
    /// Default: 0.05
    pub risk_free_rate: f64,

    /// Shares per contract
    /// Default: 100
    pub contract_multiplier: f64,

    /// Day-count basis for time to expiry
    /// Default: 365
    pub days_per_year: f64,

    /// Contract pre-filter
    pub filter: ContractFilter,

    /// Level extraction
    pub levels: LevelConfig,

    /// Cross-instrument projection
    pub projection: ProjectionConfig,

    /// Output key holding the freshness timestamp
    /// Default: "Updated"
    pub timestamp_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_ticker: "QQQ".to_string(),
            target_ticker: "MNQ".to_string(),
            target_quote_symbol: Some("MNQ=F".to_string()),
            risk_free_rate: 0.05,
            contract_multiplier: 100.0,
            days_per_year: 365.0,
            filter: ContractFilter::default(),
            levels: LevelConfig::default(),
            projection: ProjectionConfig::default(),
            timestamp_key: "Updated".to_string(),
        }
    }
}

impl EngineConfig {
    /// QQQ options projected onto Micro Nasdaq futures
    pub fn qqq_to_mnq() -> Self {
        Self::default()
    }

    /// SPY options projected onto Micro S&P futures
    pub fn spy_to_mes() -> Self {
        Self {
            source_ticker: "SPY".to_string(),
            target_ticker: "MES".to_string(),
            target_quote_symbol: Some("MES=F".to_string()),
            projection: ProjectionConfig {
                fixed_multiplier: 10.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> GexResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&json)
            .map_err(|e| GexError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GexResult<()> {
        if self.source_ticker.trim().is_empty() || self.target_ticker.trim().is_empty() {
            return Err(GexError::config("tickers must not be empty"));
        }
        if self.source_ticker.contains(' ') || self.target_ticker.contains(' ') {
            return Err(GexError::config("tickers must be single tokens"));
        }
        if self.source_ticker == self.target_ticker {
            return Err(GexError::config(format!(
                "source and target ticker are both {}",
                self.source_ticker
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(GexError::config("risk_free_rate must be finite"));
        }
        if !self.contract_multiplier.is_finite() || self.contract_multiplier <= 0.0 {
            return Err(GexError::config("contract_multiplier must be positive"));
        }
        if !self.days_per_year.is_finite() || self.days_per_year <= 0.0 {
            return Err(GexError::config("days_per_year must be positive"));
        }
        if self.levels.top_n == 0 {
            return Err(GexError::config("levels.top_n must be at least 1"));
        }
        if let Some(p) = self.filter.strike_band_percent {
            if !(p > 0.0 && p < 1.0) {
                return Err(GexError::config(format!(
                    "filter.strike_band_percent must be in (0, 1), got {}",
                    p
                )));
            }
        }
        let m = self.projection.fixed_multiplier;
        if !m.is_finite() || m <= 0.0 {
            return Err(GexError::config("projection.fixed_multiplier must be positive"));
        }
        if self.timestamp_key.is_empty() {
            return Err(GexError::config("timestamp_key must not be empty"));
        }
        let collides = LevelKind::all(self.levels.top_n).iter().any(|kind| {
            kind.key(&self.source_ticker) == self.timestamp_key
                || kind.key(&self.target_ticker) == self.timestamp_key
        });
        if collides {
            return Err(GexError::config(format!(
                "timestamp_key {:?} clashes with a level name",
                self.timestamp_key
            )));
        }
        Ok(())
    }

    pub fn exposure_model(&self) -> ExposureModel {
        ExposureModel::new(self.risk_free_rate)
            .with_multiplier(self.contract_multiplier)
            .with_days_per_year(self.days_per_year)
    }

    pub fn projector(&self) -> Projector {
        Projector::new(&self.source_ticker, &self.target_ticker, self.projection.clone())
    }
}
