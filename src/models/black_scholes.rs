//! Black-Scholes Gamma
//!
//! Closed-form Black-Scholes gamma for a single contract. Gamma is the same
//! for calls and puts; the dealer sign is applied later in the exposure stage.
//!
//! Degenerate contracts (expired, or without a usable vol quote) have zero
//! gamma rather than an error. Nonsense inputs (negative or non-finite
//! spot/strike/vol) are rejected.

use std::f64::consts::PI;

use crate::core::{GexError, GexResult};

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter (no dividend term)
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

fn check_inputs(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> GexResult<()> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(GexError::invalid_input(format!("spot must be positive and finite, got {}", spot)));
    }
    if !strike.is_finite() || strike <= 0.0 {
        return Err(GexError::invalid_input(format!("strike must be positive and finite, got {}", strike)));
    }
    if !vol.is_finite() || vol < 0.0 {
        return Err(GexError::invalid_input(format!("implied vol must be non-negative and finite, got {}", vol)));
    }
    if time.is_nan() {
        return Err(GexError::invalid_input("time to expiry is NaN"));
    }
    if !rate.is_finite() {
        return Err(GexError::invalid_input(format!("risk-free rate must be finite, got {}", rate)));
    }
    Ok(())
}

/// Black-Scholes gamma: d²V/dS²
///
/// Returns exactly 0 when `time <= 0` or `vol == 0`. Very large |d1| simply
/// underflows the density toward 0.
pub fn gamma(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> GexResult<f64> {
    check_inputs(spot, strike, time, rate, vol)?;

    if time <= 0.0 || vol <= 0.0 {
        return Ok(0.0);
    }

    let sqrt_t = time.sqrt();
    let d1 = d1(spot, strike, rate, vol, time);

    Ok(norm_pdf(d1) / (spot * vol * sqrt_t))
}
