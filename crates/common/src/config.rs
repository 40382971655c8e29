//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ReframeError, ReframeResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sampling cadences.
    pub sampling: SamplingConfig,

    /// Cropper defaults and presets.
    pub cropper: CropperDefaults,

    /// Export settings.
    pub export: ExportSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Cadences of the two periodic tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Preview sampling interval in milliseconds.
    pub preview_interval_ms: u64,

    /// Keyframe recording interval in milliseconds (wall clock).
    pub keyframe_interval_ms: u64,
}

/// Default cropper parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperDefaults {
    /// Aspect ratio selected when a session is created, as `W:H`.
    pub default_aspect_ratio: String,

    /// Ratios offered to the user.
    pub aspect_ratio_presets: Vec<String>,

    /// Playback speed multipliers offered to the user.
    pub playback_speed_presets: Vec<f64>,
}

/// Keyframe export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Suggested file name handed to the export sink.
    pub file_name: String,

    /// Pretty-print the JSON output.
    pub pretty: bool,

    /// Directory used by file-backed sinks.
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reframe_session=trace,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            cropper: CropperDefaults::default(),
            export: ExportSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            preview_interval_ms: 10,
            keyframe_interval_ms: 1000,
        }
    }
}

impl SamplingConfig {
    pub fn preview_interval(&self) -> Duration {
        Duration::from_millis(self.preview_interval_ms.max(1))
    }

    pub fn keyframe_interval(&self) -> Duration {
        Duration::from_millis(self.keyframe_interval_ms.max(1))
    }
}

impl Default for CropperDefaults {
    fn default() -> Self {
        Self {
            default_aspect_ratio: "9:16".to_string(),
            aspect_ratio_presets: ["9:18", "9:16", "4:3", "3:4", "1:1", "4:5"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            playback_speed_presets: vec![0.25, 0.5, 1.0, 1.5, 2.0, 3.0],
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: "videoData.json".to_string(),
            pretty: true,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> ReframeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ReframeError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ReframeResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ReframeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the sampling loops cannot run with.
    pub fn validate(&self) -> ReframeResult<()> {
        if self.sampling.preview_interval_ms == 0 {
            return Err(ReframeError::config("preview_interval_ms must be positive"));
        }
        if self.sampling.keyframe_interval_ms == 0 {
            return Err(ReframeError::config("keyframe_interval_ms must be positive"));
        }
        if self.export.file_name.trim().is_empty() {
            return Err(ReframeError::config("export file_name must not be empty"));
        }
        if self
            .cropper
            .playback_speed_presets
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(ReframeError::config(
                "playback speed presets must be positive numbers",
            ));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reframe").join("config.json")
}
