// SPDX-License-Identifier: GPL-3.0-only

//! Render context: configuration state machine and per-frame presentation

pub mod presenter;
pub mod state;

pub use presenter::{FrameOutcome, FramePresenter, Geometry, compute_geometry};
pub use state::{RenderState, RenderStateMachine};
