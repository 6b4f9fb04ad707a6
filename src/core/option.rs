//! Option contract rows
//!
//! One row of a listed options chain as delivered by a market data source:
//! strike, side, expiry, implied volatility and open interest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contract side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// Dealer exposure sign: +1 for calls, -1 for puts
    pub fn sign(&self) -> f64 {
        match self {
            OptionSide::Call => 1.0,
            OptionSide::Put => -1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionSide::Call => "Call",
            OptionSide::Put => "Put",
        }
    }
}

/// Immutable snapshot of one chain row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Strike price
    pub strike: f64,
    /// Call or put
    pub side: OptionSide,
    /// Expiration date
    pub expiry: NaiveDate,
    /// Implied volatility as a decimal (0.20 = 20%), `None` when not quoted
    #[serde(default)]
    pub implied_vol: Option<f64>,
    /// Outstanding contracts
    #[serde(default)]
    pub open_interest: u64,
    /// Contract symbol (exchange-specific)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl OptionContract {
    pub fn new(
        strike: f64,
        side: OptionSide,
        expiry: NaiveDate,
        implied_vol: Option<f64>,
        open_interest: u64,
    ) -> Self {
        Self {
            strike,
            side,
            expiry,
            implied_vol,
            open_interest,
            symbol: None,
        }
    }

    pub fn call(strike: f64, expiry: NaiveDate, implied_vol: f64, open_interest: u64) -> Self {
        Self::new(strike, OptionSide::Call, expiry, Some(implied_vol), open_interest)
    }

    pub fn put(strike: f64, expiry: NaiveDate, implied_vol: f64, open_interest: u64) -> Self {
        Self::new(strike, OptionSide::Put, expiry, Some(implied_vol), open_interest)
    }

    /// Implied vol if it can be fed to the gamma model, else 0.
    ///
    /// Missing, non-finite and negative quotes all collapse to 0, which the
    /// gamma model treats as "no gamma".
    pub fn usable_iv(&self) -> f64 {
        match self.implied_vol {
            Some(iv) if iv.is_finite() && iv > 0.0 => iv,
            _ => 0.0,
        }
    }

    /// Whether the contract can carry any exposure at all
    pub fn is_inert(&self) -> bool {
        self.open_interest == 0 || self.usable_iv() <= 0.0
    }

    /// Expires on the evaluation date
    pub fn is_zero_dte(&self, as_of: NaiveDate) -> bool {
        self.expiry == as_of
    }

    /// Whole calendar days until expiry (negative once expired)
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiry - as_of).num_days()
    }

    /// Time to expiry in years, using `days_per_year` as the day-count basis
    pub fn time_to_expiry(&self, as_of: NaiveDate, days_per_year: f64) -> f64 {
        self.days_to_expiry(as_of) as f64 / days_per_year
    }
}
