//! Data fetching and storage
//!
//! Handles:
//! - MarketDataSource: spot prices and option chains
//! - Yahoo Finance API for QQQ options and futures quotes (free)
//! - Level output file and chain snapshots

pub mod source;
pub mod yahoo;
pub mod store;

pub use source::*;
pub use yahoo::*;
pub use store::*;
