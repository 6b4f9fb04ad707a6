//! Pricing models
//!
//! Black-Scholes gamma is the only model the exposure engine needs.

pub mod black_scholes;

pub use black_scholes::{d1, gamma, norm_pdf};
