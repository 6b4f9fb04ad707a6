//! Core data types
//!
//! - OptionContract: strike, side, expiry, IV, open interest
//! - ChainSnapshot: one evaluation cycle's full contract batch
//! - GexError: crate error type

pub mod option;
pub mod snapshot;
pub mod error;

pub use option::*;
pub use snapshot::*;
pub use error::*;
