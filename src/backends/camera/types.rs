// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::geometry::CameraOutputSize;
use crate::gpu::TextureId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Software camera producing generated or file-backed frames
    #[default]
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Which way a lens faces relative to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    /// Faces away from the user (rear camera)
    Back,
    /// Faces the user
    Front,
}

impl std::fmt::Display for LensFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LensFacing::Back => write!(f, "back"),
            LensFacing::Front => write!(f, "front"),
        }
    }
}

/// Represents a camera device as enumerated by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub name: String,
    pub facing: LensFacing,
}

/// Opaque handle to an opened device, issued by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// Opaque handle to a configured capture session, issued by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Capture request template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTemplate {
    Preview,
}

/// Autofocus mode requested for repeating capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfMode {
    ContinuousPicture,
}

/// Repeating capture request targeting an external texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub template: CaptureTemplate,
    pub af_mode: AfMode,
    pub target: TextureId,
}

impl CaptureRequest {
    /// Preview request with continuous autofocus
    pub fn preview(target: TextureId) -> Self {
        Self {
            template: CaptureTemplate::Preview,
            af_mode: AfMode::ContinuousPicture,
            target,
        }
    }
}

/// Reason a device reported an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    /// Another client holds the device
    InUse,
    /// Permission to use the camera was denied
    AccessDenied,
    /// Device or camera service failure
    Fatal,
}

impl std::fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceErrorKind::InUse => write!(f, "camera in use"),
            DeviceErrorKind::AccessDenied => write!(f, "camera access denied"),
            DeviceErrorKind::Fatal => write!(f, "camera device failure"),
        }
    }
}

/// Lifecycle callbacks delivered by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraEvent {
    DeviceOpened(DeviceHandle),
    DeviceDisconnected,
    DeviceError(DeviceErrorKind),
    SessionConfigured(SessionHandle),
    SessionConfigureFailed,
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, shared without copying
    pub data: Arc<[u8]>,
    /// Row stride in bytes
    pub stride: u32,
    /// Monotonic frame number assigned by the producer
    pub sequence: u64,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Arc<[u8]>, sequence: u64) -> Self {
        Self {
            width,
            height,
            data,
            stride: width * 4,
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// True when the buffer holds at least `stride * height` bytes
    pub fn is_complete(&self) -> bool {
        self.stride >= self.width * 4
            && self.data.len() as u64 >= u64::from(self.stride) * u64::from(self.height)
    }

    pub fn size(&self) -> Option<CameraOutputSize> {
        CameraOutputSize::new(self.width, self.height)
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("backend not available: {0}")]
    NotAvailable(String),
    /// Camera device not found
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    /// Permission to open the device was denied
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Device held by another client
    #[error("device busy: {0}")]
    Busy(String),
    /// Device went away
    #[error("device disconnected")]
    Disconnected,
    /// Capture session could not be configured
    #[error("configure failed: {0}")]
    ConfigureFailed(String),
    /// Handle does not refer to a live device or session
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
    /// Other errors
    #[error("{0}")]
    Other(String),
}
