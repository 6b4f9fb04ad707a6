//! Level output storage
//!
//! Writes the merged level report as one JSON object. Writes go to a sibling
//! temp file which is then renamed over the target, so a reader polling the
//! file never sees a half-written document.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::core::{ChainSnapshot, GexError, GexResult};
use crate::engine::LevelReport;

/// JSON file holding the latest levels
#[derive(Debug, Clone)]
pub struct LevelStore {
    path: PathBuf,
}

impl LevelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored levels with `report`
    pub fn write(&self, report: &LevelReport) -> GexResult<()> {
        let json = serde_json::to_string_pretty(report)?;
        write_atomic(&self.path, json.as_bytes())?;

        tracing::info!(
            path = %self.path.display(),
            levels = report.merged().len(),
            "wrote levels"
        );
        Ok(())
    }

    /// Stored levels as a name → value map, `None` if nothing written yet
    pub fn read(&self) -> GexResult<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&json)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(GexError::data(format!(
                "{} does not hold a JSON object: {}",
                self.path.display(),
                other
            ))),
        }
    }
}

/// Save a collected chain for later replay
pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &ChainSnapshot) -> GexResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(snapshot)?;
    write_atomic(path, json.as_bytes())?;

    tracing::info!("Saved {} snapshot ({} rows) at {:?}", snapshot.underlying, snapshot.len(), path);
    Ok(())
}

/// Load a chain saved by `save_snapshot`
pub fn load_snapshot(path: impl AsRef<Path>) -> GexResult<ChainSnapshot> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let snapshot: ChainSnapshot = serde_json::from_str(&json)?;

    tracing::info!("Loaded {} snapshot from {:?}", snapshot.underlying, path);
    Ok(snapshot)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> GexResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
