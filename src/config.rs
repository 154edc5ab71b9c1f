use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;

/// Default model filename looked up under the models directory
const DEFAULT_MODEL_FILENAME: &str = "emotion.onnx";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,

    /// WebSocket server port
    pub port: u16,
    /// Snapshot publish cadence in ms
    pub publish_interval_ms: u64,

    // Classifier
    pub model_path: Option<PathBuf>,
    pub classifier_threads: usize,

    // Pipeline tuning
    pub calibration_frames: usize,
    pub smoothing_alpha: f32,
    pub idle_decay: f32,
    pub confidence_threshold: f32,
    pub hysteresis_ratio: f32,
    pub commit_hold_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            port: 8765,
            publish_interval_ms: 200,
            model_path: None,
            classifier_threads: 1,
            calibration_frames: 20,
            smoothing_alpha: 0.3,
            idle_decay: 0.9,
            confidence_threshold: 0.40,
            hysteresis_ratio: 1.20,
            commit_hold_ms: 500,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".emotion-bridge"))
    }

    /// Get the default models directory
    pub fn default_models_dir() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("models"))
    }

    /// Get the model file path
    pub fn get_model_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.model_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_models_dir()?.join(DEFAULT_MODEL_FILENAME))
        }
    }

    /// Engine tuning derived from this config
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            calibration_samples: self.calibration_frames,
            smoothing_alpha: self.smoothing_alpha,
            idle_decay: self.idle_decay,
            min_confidence: self.confidence_threshold,
            hysteresis_ratio: self.hysteresis_ratio,
            commit_hold_ms: self.commit_hold_ms,
        }
    }
}
