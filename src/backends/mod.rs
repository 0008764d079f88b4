// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for the camera and the host display
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             Preview core (render)            │
//! └──────────┬───────────────────────┬──────────┘
//!            │                       │
//! ┌──────────┴──────────┐ ┌──────────┴──────────┐
//! │       Camera        │ │       Display       │
//! │ session + backends  │ │ rotation, size,     │
//! │ (virtual camera)    │ │ declared orientation│
//! └─────────────────────┘ └─────────────────────┘
//! ```
//!
//! - [`camera`]: device enumeration, session lifecycle, frame delivery
//! - [`display`]: what the host window system reports about the display

pub mod camera;
pub mod display;
