//! Runtime configuration loaded from JSON.
//!
//! Every field has a default, so an empty object (or no file at all) is a
//! valid configuration. Command-line flags override file values.
//!
//! ```json
//! {
//!   "model": { "endpoint": "http://localhost:5000/model/predict", "timeout_secs": null },
//!   "processing": { "max_input_size": 512, "workers": 4, "palette": "rank", "preview_columns": 80 }
//! }
//! ```
use crate::compositor::PaletteAssignment;
use crate::error::{Error, Result};
use crate::model::DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub processing: ProcessingConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Prediction endpoint of the segmentation service.
    pub endpoint: String,
    /// Per-request timeout. `None` waits for the model as long as it takes.
    pub timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Longest side, in pixels, of the image handed to the model.
    pub max_input_size: u32,
    /// Worker threads for directory scans. `None` uses one per CPU core.
    pub workers: Option<usize>,
    pub palette: PaletteAssignment,
    /// Maximum width of terminal previews, in character cells.
    pub preview_columns: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_input_size: 512,
            workers: None,
            palette: PaletteAssignment::Rank,
            preview_columns: 80,
        }
    }
}

impl ProcessingConfig {
    /// Effective worker count, never zero.
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    parse_config(&data)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

pub fn parse_config(json: &str) -> std::result::Result<Config, serde_json::Error> {
    serde_json::from_str(json)
}
