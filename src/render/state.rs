// SPDX-License-Identifier: GPL-3.0-only

//! Render/configuration state machine
//!
//! ```text
//!                 camera ready
//! AwaitingCamera ─────────────▶ AwaitingFirstConfig ──geometry computed──▶ Configured
//!       ▲                              ▲                                      │
//!       │                              └──────── surface changed ─────────────┘
//!       └──────────────── camera lost (from any state) ───────────────────────┘
//! ```
//!
//! Only `Configured` permits drawing with geometry; every other state renders
//! the clear colour alone. `Configured` is reachable only through
//! `AwaitingFirstConfig`, so real geometry is never drawn before it has been
//! computed for the current display.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Camera not streaming yet (or lost)
    AwaitingCamera,
    /// Camera ready; geometry must be computed before drawing
    AwaitingFirstConfig,
    /// Geometry is current
    Configured,
}

impl std::fmt::Display for RenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderState::AwaitingCamera => write!(f, "awaiting-camera"),
            RenderState::AwaitingFirstConfig => write!(f, "awaiting-first-config"),
            RenderState::Configured => write!(f, "configured"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderStateMachine {
    state: RenderState,
    /// Bumped every time geometry is computed
    generation: u64,
}

impl Default for RenderStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderStateMachine {
    pub fn new() -> Self {
        Self {
            state: RenderState::AwaitingCamera,
            generation: 0,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Number of completed geometry computations
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Feed the current camera ready flag
    pub fn camera_ready_changed(&mut self, ready: bool) {
        match (self.state, ready) {
            (RenderState::AwaitingCamera, true) => self.transition(RenderState::AwaitingFirstConfig),
            (RenderState::AwaitingCamera, false) => {}
            (_, false) => self.transition(RenderState::AwaitingCamera),
            (_, true) => {}
        }
    }

    /// The render surface changed size; geometry must be recomputed
    pub fn surface_changed(&mut self) {
        if self.state != RenderState::AwaitingCamera {
            self.transition(RenderState::AwaitingFirstConfig);
        }
    }

    /// The render surface was (re)created
    pub fn surface_created(&mut self) {
        self.surface_changed();
    }

    /// Orientation and viewport have been computed for the current display
    ///
    /// Ignored outside `AwaitingFirstConfig`.
    pub fn geometry_computed(&mut self) {
        if self.state == RenderState::AwaitingFirstConfig {
            self.generation += 1;
            self.transition(RenderState::Configured);
        }
    }

    pub fn needs_geometry(&self) -> bool {
        self.state == RenderState::AwaitingFirstConfig
    }

    pub fn may_draw(&self) -> bool {
        self.state == RenderState::Configured
    }

    fn transition(&mut self, next: RenderState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Render state changed");
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_ignored_while_awaiting_camera() {
        let mut sm = RenderStateMachine::new();
        sm.geometry_computed();
        assert_eq!(sm.state(), RenderState::AwaitingCamera);
        assert_eq!(sm.generation(), 0);
    }

    #[test]
    fn test_happy_path() {
        let mut sm = RenderStateMachine::new();
        sm.camera_ready_changed(true);
        assert!(sm.needs_geometry());
        sm.geometry_computed();
        assert!(sm.may_draw());
        assert_eq!(sm.generation(), 1);
    }

    #[test]
    fn test_surface_change_forces_recompute() {
        let mut sm = RenderStateMachine::new();
        sm.camera_ready_changed(true);
        sm.geometry_computed();
        sm.surface_changed();
        assert_eq!(sm.state(), RenderState::AwaitingFirstConfig);
        assert!(!sm.may_draw());
    }

    #[test]
    fn test_surface_change_before_camera_is_noop() {
        let mut sm = RenderStateMachine::new();
        sm.surface_created();
        assert_eq!(sm.state(), RenderState::AwaitingCamera);
    }

    #[test]
    fn test_camera_loss_returns_to_awaiting_camera() {
        let mut sm = RenderStateMachine::new();
        sm.camera_ready_changed(true);
        sm.geometry_computed();
        sm.camera_ready_changed(false);
        assert_eq!(sm.state(), RenderState::AwaitingCamera);
    }

    #[test]
    fn test_ready_again_while_configured_keeps_geometry() {
        let mut sm = RenderStateMachine::new();
        sm.camera_ready_changed(true);
        sm.geometry_computed();
        sm.camera_ready_changed(true);
        assert_eq!(sm.state(), RenderState::Configured);
    }
}
