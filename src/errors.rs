// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the preview application
//!
//! Mirrors the failure classes of the preview core:
//! - camera unavailable (no device, busy, denied, disconnected)
//! - capture session configuration failed
//! - GPU resource failures, fatal to the render context
//!
//! A frame without a new camera image is not an error and never shows up here.

use crate::backends::camera::SessionError;
use crate::config::ConfigError;
use crate::gpu::GpuError;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// No usable camera, or access was refused
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// The capture session could not be configured
    #[error("capture session configuration failed: {0}")]
    ConfigurationFailed(String),

    /// GPU resource creation or submission failed
    #[error(transparent)]
    Gpu(#[from] GpuError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::DeviceUnavailable(msg) => AppError::DeviceUnavailable(msg),
            SessionError::ConfigurationFailed(msg) => AppError::ConfigurationFailed(msg),
            other => AppError::Other(other.to_string()),
        }
    }
}
