//! Configuration for level extraction and projection

use serde::{Deserialize, Serialize};

/// How walls pick their strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallBasis {
    /// Most extreme summed GEX per side
    #[default]
    Gex,
    /// Largest summed open interest per side
    OpenInterest,
}

/// Level extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Number of high-gamma strikes to report
    /// Default: 4
    pub top_n: usize,

    /// Wall selection basis
    /// Default: Gex
    pub wall_basis: WallBasis,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            top_n: 4,
            wall_basis: WallBasis::Gex,
        }
    }
}

impl LevelConfig {
    /// Two high-gamma strikes, as the earlier level sheets reported
    pub fn legacy_top2() -> Self {
        Self {
            top_n: 2,
            ..Default::default()
        }
    }

    /// Walls from open interest instead of GEX
    pub fn open_interest_walls() -> Self {
        Self {
            wall_basis: WallBasis::OpenInterest,
            ..Default::default()
        }
    }
}

/// Where the projection ratio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// target spot / source spot, falling back to the fixed multiplier
    /// when no target price is available
    #[default]
    Live,
    /// Always the fixed multiplier
    Fixed,
}

/// Cross-instrument projection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Default: Live
    pub mode: ProjectionMode,

    /// Constant target/source ratio
    /// Default: 40.0 (MNQ ≈ 40 × QQQ)
    pub fixed_multiplier: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Live,
            fixed_multiplier: 40.0,
        }
    }
}

impl ProjectionConfig {
    pub fn fixed(multiplier: f64) -> Self {
        Self {
            mode: ProjectionMode::Fixed,
            fixed_multiplier: multiplier,
        }
    }
}
