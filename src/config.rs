//! Writer configuration, loadable from a JSON file

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default directory segment files are written to
pub const DEFAULT_ROOT_DIR: &str = "captures";

/// Default node identifier
pub const DEFAULT_NODE_ID: &str = "ET0001";

/// Default samples per second
pub const DEFAULT_SAMPLE_RATE: f64 = 20000.0;

/// Settings for a capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Directory holding the segment files
    pub root_dir: PathBuf,
    /// Identifier of the recording node
    pub node_id: String,
    /// Samples per second
    pub sample_rate: f64,
    /// Capture id to resume; a fresh one is generated when absent
    pub capture_id: Option<Uuid>,
    /// Roll to a new segment after this many lines
    pub roll_every: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            node_id: DEFAULT_NODE_ID.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            capture_id: None,
            roll_every: None,
        }
    }
}

impl CaptureConfig {
    /// Load and validate a JSON configuration file. Missing keys take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(Error::file(path))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_source(&self.node_id, self.sample_rate)?;
        if self.roll_every == Some(0) {
            return Err(Error::Configuration("roll_every must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Check the node id and sample rate every header of a session will carry
pub fn validate_source(node_id: &str, sample_rate: f64) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(Error::Configuration(format!(
            "sample_rate must be a positive number, got {sample_rate}"
        )));
    }
    if node_id.is_empty() {
        return Err(Error::Configuration("node_id must not be empty".to_string()));
    }
    Ok(())
}
