//! Merged output of one computation run

use chrono::Local;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::exposure::StrikeGexCurve;
use crate::levels::LevelSet;

/// Local wall-clock timestamp, e.g. "2025-01-20 15:42:07.123456"
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Source levels, projected levels and a freshness stamp
///
/// Serializes as one flat map: present levels only, then the timestamp.
#[derive(Debug, Clone)]
pub struct LevelReport {
    pub source: LevelSet,
    pub projected: LevelSet,
    pub generated_at: String,
    pub timestamp_key: String,
    /// Ratio applied to get `projected`
    pub ratio: f64,
    /// True when the fixed multiplier stood in for a live ratio
    pub used_fixed_ratio: bool,
    /// Aggregated curve the levels came from
    pub curve: StrikeGexCurve,
}

impl LevelReport {
    /// Source and projected levels in one set
    pub fn merged(&self) -> LevelSet {
        let mut merged = self.source.clone();
        merged.merge(&self.projected);
        merged
    }

    /// Net GEX across all strikes
    pub fn net_gex(&self) -> f64 {
        self.curve.total_gex()
    }
}

impl Serialize for LevelReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let merged = self.merged();
        let mut map = serializer.serialize_map(Some(merged.len() + 1))?;
        for (name, value) in merged.present() {
            map.serialize_entry(name, &value)?;
        }
        map.serialize_entry(&self.timestamp_key, &self.generated_at)?;
        map.end()
    }
}
