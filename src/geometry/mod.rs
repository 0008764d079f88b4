// SPDX-License-Identifier: GPL-3.0-only

//! Orientation and viewport geometry
//!
//! Pure functions that turn the host display state and the negotiated camera
//! output size into the values the presenter feeds to the GPU:
//!
//! ```text
//! DisplayRotation ──┐
//!                   ├─► orientation::resolve ─► RotationClass ─► TextureCoordSet
//! DeviceMountModel ─┘
//!
//! display pixels ───┐
//!                   ├─► compute_viewport ─► ViewportRect
//! CameraOutputSize ─┘
//! ```
//!
//! Nothing here holds state; every call with the same inputs yields the same
//! output, so geometry can be recomputed freely on configuration changes.

pub mod orientation;
pub mod viewport;

pub use orientation::{DeviceMountModel, RotationClass, TextureCoordSet, resolve};
pub use viewport::{CameraOutputSize, ViewportRect, compute_viewport};
