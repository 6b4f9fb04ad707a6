//! # GEX Levels - Dealer Gamma Exposure
//!
//! Computes dealer gamma exposure (GEX) from a listed option chain and reduces
//! it to a handful of named price levels, projected onto a correlated futures
//! contract (QQQ options → MNQ futures by default).
//!
//! ## Overview
//!
//! Per evaluation cycle:
//! - **Gamma**: Black-Scholes gamma for each contract
//! - **GEX**: gamma × open interest × 100 × spot, negated for puts
//! - **Curve**: net GEX per strike plus its running cumulative sum
//! - **Levels**: walls, gamma flip, max/min gamma, top-N |GEX|, IV extremes
//! - **Projection**: levels rescaled by the target/source price ratio
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gex_levels::prelude::*;
//! use chrono::Local;
//!
//! let engine = GexEngine::new(EngineConfig::qqq_to_mnq()).unwrap();
//! let yahoo = YahooClient::new().unwrap();
//!
//! let report = engine.run(&yahoo, Local::now().date_naive()).unwrap();
//! LevelStore::new("levels.json").write(&report).unwrap();
//! ```
//!
//! ## What This Does NOT Do
//!
//! - Infer actual dealer positioning (dealers are assumed long calls, short puts)
//! - Use intraday time to expiry (same-day expiries carry zero gamma)
//! - Schedule runs or serve results over a network

pub mod core;
pub mod data;
pub mod engine;
pub mod exposure;
pub mod levels;
pub mod models;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{ChainSnapshot, GexError, GexResult, OptionContract, OptionSide};

    // Data
    pub use crate::data::{
        load_snapshot, save_snapshot, ChainRows, InMemorySource, LevelStore, MarketDataSource,
        YahooClient,
    };

    // Gamma model
    pub use crate::models::{gamma, norm_pdf};

    // Exposure
    pub use crate::exposure::{
        aggregate, ContractFilter, ExposureModel, GexContribution, StrikeGexCurve, StrikePoint,
    };

    // Levels
    pub use crate::levels::{
        contract_iv_by_strike, extract_levels, gamma_flip, project, LevelConfig, LevelExtractor,
        LevelKind, LevelSet, ProjectionConfig, ProjectionMode, Projector, WallBasis,
    };

    // Engine
    pub use crate::engine::{timestamp_now, EngineConfig, GexEngine, LevelReport};
}

// Re-export main types at crate root
pub use crate::core::{GexError, GexResult};
pub use crate::engine::{EngineConfig, GexEngine, LevelReport};
