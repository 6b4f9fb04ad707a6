//! Cross-instrument projection
//!
//! Rescales levels from the options underlying onto a correlated instrument
//! (QQQ → MNQ) by a price ratio, renaming each level's ticker token.

use crate::core::{GexError, GexResult};

use super::{LevelSet, ProjectionConfig, ProjectionMode};

/// Replace every whitespace-separated `source` token in `name` with `target`
pub fn rename_ticker(name: &str, source: &str, target: &str) -> String {
    name.split(' ')
        .map(|token| if token == source { target } else { token })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Multiply every present level by `ratio` and rename it to the target ticker.
///
/// Absent levels stay absent under their new name.
pub fn project_with_ratio(
    levels: &LevelSet,
    ratio: f64,
    source_ticker: &str,
    target_ticker: &str,
) -> GexResult<LevelSet> {
    if !ratio.is_finite() || ratio == 0.0 {
        return Err(GexError::invalid_input(format!(
            "projection ratio must be finite and non-zero, got {}",
            ratio
        )));
    }

    let mut projected = LevelSet::new();
    for (name, value) in levels.iter() {
        projected.insert(
            rename_ticker(name, source_ticker, target_ticker),
            value.map(|v| v * ratio),
        );
    }
    Ok(projected)
}

/// Project with the live ratio `target_spot / source_spot`
pub fn project(
    levels: &LevelSet,
    source_spot: f64,
    target_spot: f64,
    source_ticker: &str,
    target_ticker: &str,
) -> GexResult<LevelSet> {
    if source_spot == 0.0 {
        return Err(GexError::invalid_input("source spot is zero"));
    }
    if !source_spot.is_finite() || !target_spot.is_finite() {
        return Err(GexError::invalid_input(format!(
            "spots must be finite, got source={} target={}",
            source_spot, target_spot
        )));
    }
    project_with_ratio(levels, target_spot / source_spot, source_ticker, target_ticker)
}

/// Projection between a fixed pair of tickers
#[derive(Debug, Clone)]
pub struct Projector {
    source_ticker: String,
    target_ticker: String,
    config: ProjectionConfig,
}

/// Projected levels plus the ratio actually used
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub levels: LevelSet,
    pub ratio: f64,
    /// True when the fixed multiplier stood in for a live ratio
    pub used_fixed: bool,
}

impl Projector {
    pub fn new(
        source_ticker: impl Into<String>,
        target_ticker: impl Into<String>,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            source_ticker: source_ticker.into(),
            target_ticker: target_ticker.into(),
            config,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project `levels`, using the live ratio when configured and a target
    /// price is available, else the fixed multiplier
    pub fn apply(
        &self,
        levels: &LevelSet,
        source_spot: f64,
        target_spot: Option<f64>,
    ) -> GexResult<Projection> {
        let live_target = match self.config.mode {
            ProjectionMode::Live => match target_spot {
                Some(t) if t.is_finite() && t > 0.0 => Some(t),
                other => {
                    tracing::warn!(
                        target = %self.target_ticker,
                        target_spot = ?other,
                        multiplier = self.config.fixed_multiplier,
                        "no live target price, using fixed multiplier"
                    );
                    None
                }
            },
            ProjectionMode::Fixed => None,
        };

        match live_target {
            Some(t) => {
                let projected = project(levels, source_spot, t, &self.source_ticker, &self.target_ticker)?;
                Ok(Projection {
                    levels: projected,
                    ratio: t / source_spot,
                    used_fixed: false,
                })
            }
            None => {
                let ratio = self.config.fixed_multiplier;
                let projected =
                    project_with_ratio(levels, ratio, &self.source_ticker, &self.target_ticker)?;
                Ok(Projection {
                    levels: projected,
                    ratio,
                    used_fixed: true,
                })
            }
        }
    }
}
