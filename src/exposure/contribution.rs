//! Per-contract gamma exposure
//!
//! GEX = gamma × open interest × contract multiplier × spot, signed positive
//! for calls and negative for puts (dealers assumed long calls / short puts
//! against customer flow).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{GexResult, OptionContract, OptionSide};
use crate::models::black_scholes;

/// Standard listed equity option multiplier
pub const DEFAULT_CONTRACT_MULTIPLIER: f64 = 100.0;

/// Calendar-day basis for time to expiry
pub const DEFAULT_DAYS_PER_YEAR: f64 = 365.0;

/// Signed exposure of one contract, consumed by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GexContribution {
    pub strike: f64,
    /// Calls positive, puts negative
    pub signed_gex: f64,
    pub side: OptionSide,
    pub zero_dte: bool,
    /// Usable implied vol, `None` when the row had no usable quote
    pub implied_vol: Option<f64>,
    pub open_interest: u64,
}

/// Pre-filter applied to contract rows before exposure is computed
///
/// Dropping inert rows does not change any GEX value (they contribute 0);
/// it only shrinks the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractFilter {
    /// Drop rows with zero open interest or no usable implied vol
    /// Default: true
    pub drop_inert: bool,

    /// Keep only strikes within ±band of spot, as a fraction
    /// (0.15 keeps [0.85·spot, 1.15·spot])
    /// Default: None (no band)
    pub strike_band_percent: Option<f64>,
}

impl Default for ContractFilter {
    fn default() -> Self {
        Self {
            drop_inert: true,
            strike_band_percent: None,
        }
    }
}

impl ContractFilter {
    /// Keep every row
    pub fn none() -> Self {
        Self {
            drop_inert: false,
            strike_band_percent: None,
        }
    }

    /// Band around spot, inert rows dropped
    pub fn band(percent: f64) -> Self {
        Self {
            strike_band_percent: Some(percent),
            ..Default::default()
        }
    }

    pub fn admits(&self, contract: &OptionContract, spot: f64) -> bool {
        if self.drop_inert && contract.is_inert() {
            return false;
        }
        match self.strike_band_percent {
            Some(p) => {
                let low = spot * (1.0 - p);
                let high = spot * (1.0 + p);
                contract.strike >= low && contract.strike <= high
            }
            None => true,
        }
    }
}

/// Turns contract rows into signed exposure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureModel {
    pub risk_free_rate: f64,
    pub contract_multiplier: f64,
    pub days_per_year: f64,
}

impl ExposureModel {
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            contract_multiplier: DEFAULT_CONTRACT_MULTIPLIER,
            days_per_year: DEFAULT_DAYS_PER_YEAR,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.contract_multiplier = multiplier;
        self
    }

    pub fn with_days_per_year(mut self, days: f64) -> Self {
        self.days_per_year = days;
        self
    }

    /// Exposure of a single contract
    pub fn contribution(
        &self,
        contract: &OptionContract,
        spot: f64,
        as_of: NaiveDate,
    ) -> GexResult<GexContribution> {
        let time = contract.time_to_expiry(as_of, self.days_per_year);
        let iv = contract.usable_iv();
        let gamma = black_scholes::gamma(spot, contract.strike, time, self.risk_free_rate, iv)?;

        let raw_gex = gamma * contract.open_interest as f64 * self.contract_multiplier * spot;

        Ok(GexContribution {
            strike: contract.strike,
            signed_gex: contract.side.sign() * raw_gex,
            side: contract.side,
            zero_dte: contract.is_zero_dte(as_of),
            implied_vol: (iv > 0.0).then_some(iv),
            open_interest: contract.open_interest,
        })
    }

    /// Filter a batch and compute every surviving contract's exposure
    pub fn contributions<'a>(
        &self,
        contracts: impl IntoIterator<Item = &'a OptionContract>,
        spot: f64,
        as_of: NaiveDate,
        filter: &ContractFilter,
    ) -> GexResult<Vec<GexContribution>> {
        let mut out = Vec::new();
        let mut dropped = 0usize;

        for contract in contracts {
            if !filter.admits(contract, spot) {
                dropped += 1;
                continue;
            }
            out.push(self.contribution(contract, spot, as_of)?);
        }

        tracing::debug!(kept = out.len(), dropped, "computed contract exposure");
        Ok(out)
    }
}

/// Exposure of one contract with the standard multiplier and day count
pub fn contribution_of(
    contract: &OptionContract,
    spot: f64,
    risk_free_rate: f64,
    as_of: NaiveDate,
) -> GexResult<GexContribution> {
    ExposureModel::new(risk_free_rate).contribution(contract, spot, as_of)
}
