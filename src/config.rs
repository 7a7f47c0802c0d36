use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::BootTimeError;

const ENV_PREFIX: &str = "LAUNCHBENCH";

/// Everything a measurement run needs, passed explicitly to each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub detection: DetectionConfig,
    pub decoder: DecoderConfig,
    pub capture: CaptureConfig,
    pub similarity: SimilarityConfig,
    pub app: AppConfig,
    /// Root of the per-day session directories.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A frame scoring strictly below this against frame 0 marks the start.
    pub start_threshold: f64,
    /// Plateau level for the end-reference falling edge.
    pub end_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub fps: u32,
    pub start_offset_secs: u32,
    pub duration_secs: u32,
    pub width: u32,
    pub height: u32,
    pub ffmpeg_path: PathBuf,
    pub frame_extension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub pre_launch_delay_ms: u64,
    pub settle_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Downscale both images to this width before comparing. `None` compares at full size.
    pub max_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// Holds one `<app name>/end.png` per measured app.
    pub reference_dir: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            decoder: DecoderConfig::default(),
            capture: CaptureConfig::default(),
            similarity: SimilarityConfig::default(),
            app: AppConfig::default(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            start_threshold: 0.90,
            end_threshold: 0.97,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            fps: 50,
            start_offset_secs: 1,
            duration_secs: 10,
            width: 1080,
            height: 1920,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            frame_extension: "png".to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            pre_launch_delay_ms: 2_000,
            settle_time_ms: 12_000,
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { max_width: None }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            reference_dir: PathBuf::from("reference"),
        }
    }
}

impl Configuration {
    /// Layers built-in defaults, an optional file, then `LAUNCHBENCH_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, BootTimeError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let configuration: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        configuration
            .validate()
            .map_err(BootTimeError::InvalidConfig)?;
        Ok(configuration)
    }

    /// Reference end-state image for the configured app.
    pub fn reference_end_image(&self) -> PathBuf {
        self.app.reference_dir.join(&self.app.name).join("end.png")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let in_unit_range = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit_range(self.detection.start_threshold) {
            return Err("Start threshold must be in (0.0, 1.0]".to_string());
        }

        if !in_unit_range(self.detection.end_threshold) {
            return Err("End threshold must be in (0.0, 1.0]".to_string());
        }

        if self.decoder.fps == 0 {
            return Err("Frame rate must be greater than 0".to_string());
        }

        if self.decoder.width == 0 || self.decoder.height == 0 {
            return Err("Decoder resolution must be non-zero".to_string());
        }

        if self.decoder.duration_secs == 0 {
            return Err("Decode window duration must be greater than 0".to_string());
        }

        if self.similarity.max_width == Some(0) {
            return Err("Similarity max width must be greater than 0".to_string());
        }

        if self.app.name.trim().is_empty() {
            return Err("App name must not be empty".to_string());
        }

        Ok(())
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.decoder.fps = fps;
        self
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app.name = name.into();
        self
    }
}
