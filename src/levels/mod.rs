//! Named GEX levels
//!
//! Summary strikes derived from the aggregated curve:
//! - **Walls**: strikes with the most extreme one-sided exposure (support/resistance)
//! - **Gamma flip**: where net cumulative dealer gamma comes closest to zero
//! - **Max/Min gamma, high gamma**: strikes with the largest/smallest |net GEX|
//! - **IV extremes**: strikes with the highest/lowest mean implied vol
//!
//! Levels are keyed by human-readable names (`"QQQ Put Wall"`) and can be
//! projected onto a correlated instrument (`"MNQ Put Wall"`).

mod config;
mod extractor;
mod projector;

pub use config::*;
pub use extractor::*;
pub use projector::*;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Kind of named level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelKind {
    PutWall,
    CallWall,
    PutWall0Dte,
    CallWall0Dte,
    MaxGamma,
    MinGamma,
    GammaFlip,
    GammaFlip0Dte,
    MaxIv,
    MinIv,
    /// Rank among the top-N |GEX| strikes, 1-based
    HighGamma(usize),
}

impl LevelKind {
    /// Label used in output keys
    pub fn label(&self) -> String {
        match self {
            LevelKind::PutWall => "Put Wall".to_string(),
            LevelKind::CallWall => "Call Wall".to_string(),
            LevelKind::PutWall0Dte => "Put Wall 0DTE".to_string(),
            LevelKind::CallWall0Dte => "Call Wall 0DTE".to_string(),
            LevelKind::MaxGamma => "Max Gamma".to_string(),
            LevelKind::MinGamma => "Min Gamma".to_string(),
            LevelKind::GammaFlip => "Gamma Flip".to_string(),
            LevelKind::GammaFlip0Dte => "Gamma Flip 0DTE".to_string(),
            LevelKind::MaxIv => "Max IV".to_string(),
            LevelKind::MinIv => "Min IV".to_string(),
            LevelKind::HighGamma(rank) => format!("High Gamma-{}", rank),
        }
    }

    /// Output key for a ticker: "QQQ Put Wall"
    pub fn key(&self, ticker: &str) -> String {
        format!("{} {}", ticker, self.label())
    }

    /// Every kind extracted with `top_n` High Gamma slots, in output order
    pub fn all(top_n: usize) -> Vec<LevelKind> {
        let mut kinds = vec![
            LevelKind::PutWall,
            LevelKind::CallWall,
            LevelKind::PutWall0Dte,
            LevelKind::CallWall0Dte,
            LevelKind::MaxGamma,
            LevelKind::MinGamma,
            LevelKind::GammaFlip,
            LevelKind::GammaFlip0Dte,
            LevelKind::MaxIv,
            LevelKind::MinIv,
        ];
        kinds.extend((1..=top_n).map(LevelKind::HighGamma));
        kinds
    }
}

/// Round to 2 decimals
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Ordered name → value mapping where a value may be absent.
///
/// Values are rounded to 2 decimals on insert; NaN/Inf become absent.
/// Absent entries are kept for inspection but never serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSet {
    entries: Vec<(String, Option<f64>)>,
}

impl LevelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a level
    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        let name = name.into();
        let value = match value {
            Some(v) if v.is_finite() => Some(round2(v)),
            Some(v) => {
                tracing::warn!(level = %name, value = %v, "dropping non-finite level value");
                None
            }
            None => None,
        };

        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Present value for a level name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| *v)
    }

    /// Present value for a level kind under a ticker
    pub fn level(&self, ticker: &str, kind: LevelKind) -> Option<f64> {
        self.get(&kind.key(ticker))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All entries in insertion order, absent ones included
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Present entries only
    pub fn present(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.map(|v| (k.as_str(), v)))
    }

    /// Number of present entries
    pub fn len(&self) -> usize {
        self.present().count()
    }

    /// True when no entry has a value
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append another set; its entries replace same-named ones
    pub fn merge(&mut self, other: &LevelSet) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }
}

impl Serialize for LevelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.present() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
