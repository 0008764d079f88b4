// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user configuration
//!
//! Stored as pretty JSON at `<config dir>/camera-preview/config.json`. Missing
//! files and missing fields fall back to defaults.

use crate::backends::camera::{CameraBackendType, LensFacing};
use crate::backends::display::{DeclaredOrientation, DisplayRotation};
use crate::constants::{self, CLEAR_COLOR};
use crate::geometry::CameraOutputSize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where the virtual camera gets its pixels from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualSource {
    /// Coloured quadrants with an arrow marking the top edge
    #[default]
    TestPattern,
    /// Still image, scaled to the stream size
    Image { path: PathBuf },
}

/// One device advertised by the virtual camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDeviceSettings {
    pub name: String,
    pub facing: LensFacing,
    /// Output sizes in advertised order
    pub sizes: Vec<CameraOutputSize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualCameraSettings {
    pub devices: Vec<VirtualDeviceSettings>,
    pub source: VirtualSource,
    pub frame_interval_ms: u64,
}

impl Default for VirtualCameraSettings {
    fn default() -> Self {
        let sizes = |list: &[[u32; 2]]| {
            list.iter()
                .filter_map(|[w, h]| CameraOutputSize::new(*w, *h))
                .collect::<Vec<_>>()
        };
        Self {
            devices: vec![
                VirtualDeviceSettings {
                    name: "Virtual rear camera".to_string(),
                    facing: LensFacing::Back,
                    sizes: sizes(&constants::virtual_camera::DEFAULT_SIZES),
                },
                VirtualDeviceSettings {
                    name: "Virtual front camera".to_string(),
                    facing: LensFacing::Front,
                    sizes: sizes(&constants::virtual_camera::DEFAULT_SIZES[1..]),
                },
            ],
            source: VirtualSource::default(),
            frame_interval_ms: constants::virtual_camera::FRAME_INTERVAL.as_millis() as u64,
        }
    }
}

/// Display simulated by the headless runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    pub rotation: u32,
    pub declared: DeclaredOrientation,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let [width, height] = constants::runner::DEFAULT_DISPLAY;
        Self {
            width,
            height,
            rotation: 0,
            declared: DeclaredOrientation::Portrait,
        }
    }
}

impl DisplaySettings {
    pub fn rotation(&self) -> Option<DisplayRotation> {
        DisplayRotation::from_degrees(self.rotation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Colour the surface is cleared to every frame
    pub clear_color: [f32; 4],
    /// Camera backend to use
    pub backend: CameraBackendType,
    pub virtual_camera: VirtualCameraSettings,
    pub display: DisplaySettings,
    /// Default directory for `run --snapshot` without a path
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clear_color: CLEAR_COLOR,
            backend: CameraBackendType::default(),
            virtual_camera: VirtualCameraSettings::default(),
            display: DisplaySettings::default(),
            snapshot_dir: None,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::config::APP_DIR)
                .join(constants::config::FILE_NAME)
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No platform config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(write_err)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return invalid(format!(
                "clear_color components must be within 0..1, got {:?}",
                self.clear_color
            ));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return invalid(format!(
                "display size must be non-zero, got {}x{}",
                self.display.width, self.display.height
            ));
        }
        if self.display.rotation().is_none() {
            return invalid(format!(
                "display rotation must be 0, 90, 180 or 270, got {}",
                self.display.rotation
            ));
        }
        if self.virtual_camera.frame_interval_ms == 0 {
            return invalid("virtual camera frame interval must be non-zero".to_string());
        }
        if let Some(device) = self
            .virtual_camera
            .devices
            .iter()
            .find(|d| d.sizes.is_empty())
        {
            return invalid(format!("virtual device '{}' advertises no sizes", device.name));
        }
        Ok(())
    }
}
