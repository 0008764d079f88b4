// SPDX-License-Identifier: GPL-3.0-only

//! Camera Preview - full-screen rear camera preview with orientation-correct presentation
//!
//! Streams frames from the rear camera into a GPU texture and draws them
//! full-screen, upright for any display rotation and device mounting.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`geometry`]: orientation resolver and viewport/crop calculator (pure)
//! - [`backends`]: camera session and backends, host display seam
//! - [`gpu`]: renderer seam, external image stream, wgpu renderer
//! - [`render`]: render/configuration state machine and frame presenter
//! - [`config`]: user configuration handling
//!
//! Two contexts run concurrently: the render context (surface callbacks and
//! per-frame draws) and the camera-callbacks worker. They share only the
//! session's published state and the image stream.
//!
//! # Example
//!
//! ```ignore
//! let backend = get_backend(&config)?;
//! let display = Arc::new(SimulatedDisplay::new(1080, 1920, DisplayRotation::Rotation0, DeclaredOrientation::Portrait));
//! let (mut presenter, producer) = FramePresenter::new(WgpuRenderer::new()?, display, config.clear_color)?;
//! let mut session = CameraSession::new(backend, producer);
//! presenter.bind_session(session.monitor());
//! session.open()?;
//! presenter.on_surface_created(1080, 1920)?;
//! loop { presenter.draw_frame()?; }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod geometry;
pub mod gpu;
pub mod render;

// Re-export commonly used types
pub use backends::camera::{CameraBackend, CameraSession, SessionMonitor, SessionState, get_backend};
pub use backends::display::{DeclaredOrientation, DisplayHost, DisplayRotation, SimulatedDisplay};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use geometry::{CameraOutputSize, DeviceMountModel, RotationClass, ViewportRect};
pub use render::{FrameOutcome, FramePresenter};
