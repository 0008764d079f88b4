// SPDX-License-Identifier: GPL-3.0-only
// Camera backend with trait-based abstraction

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Frame presenter    │  ← reads SessionMonitor, pulls images
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CameraSession     │  ← state machine on the camera-callbacks worker
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← enumerate, open, configure, repeat, close
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │Virtual camera│  ← software implementation
//!     └──────────────┘
//! ```
//!
//! Device access is asynchronous: `open` and `create_capture_session` return
//! once the request is accepted and report the outcome later through
//! [`CameraCallbacks`]. The session consumes those callbacks on its own worker.

pub mod frame_loop;
pub mod session;
pub mod types;
pub mod virtual_camera;

pub use session::{
    CameraCallbacks, CameraSession, SessionError, SessionFailure, SessionMonitor, SessionState,
};
pub use types::*;

use crate::config::Config;
use crate::geometry::CameraOutputSize;
use crate::gpu::external_texture::ImageProducer;
use std::sync::Arc;

/// Camera subsystem seam
///
/// Backends are shared between the caller and the session worker, so every
/// method takes `&self`.
pub trait CameraBackend: Send + Sync {
    /// Which backend this is
    fn backend_type(&self) -> CameraBackendType;

    // ===== Enumeration =====

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>>;

    /// Output sizes the device can stream, in the order the device advertises them
    fn output_sizes(&self, device: &CameraDevice) -> BackendResult<Vec<CameraOutputSize>>;

    // ===== Lifecycle =====

    /// Request access to a device
    ///
    /// Completion arrives as `opened`, `error` or `disconnected` on `callbacks`.
    /// An `Err` return means the request was refused outright and no callback
    /// will follow.
    fn open(&self, device: &CameraDevice, callbacks: CameraCallbacks) -> BackendResult<()>;

    /// Create a capture session that writes into `target`
    ///
    /// Completion arrives as `configured` or `configure_failed`.
    fn create_capture_session(
        &self,
        device: DeviceHandle,
        target: ImageProducer,
        callbacks: CameraCallbacks,
    ) -> BackendResult<()>;

    /// Start repeating capture into the session's target
    fn set_repeating_request(
        &self,
        session: SessionHandle,
        request: CaptureRequest,
    ) -> BackendResult<()>;

    /// Release a device and everything streaming from it
    fn close(&self, device: DeviceHandle) -> BackendResult<()>;
}

/// Create the backend selected in the configuration
pub fn get_backend(config: &Config) -> BackendResult<Arc<dyn CameraBackend>> {
    match config.backend {
        CameraBackendType::Virtual => {
            let backend = virtual_camera::VirtualCameraBackend::from_settings(&config.virtual_camera)?;
            Ok(Arc::new(backend))
        }
    }
}
