//! Gamma exposure
//!
//! - `contribution`: per-contract signed GEX and the row pre-filter
//! - `curve`: aggregation of contributions into a strike curve

mod contribution;
mod curve;

pub use contribution::*;
pub use curve::*;
