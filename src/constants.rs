// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Colour the target surface is cleared to every frame (RGBA)
pub const CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 1.0, 1.0];

/// Full clip-space quad, triangle-strip order: top-left, bottom-left, top-right, bottom-right
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, 1.0], [-1.0, -1.0], [1.0, 1.0], [1.0, -1.0]];

/// Number of vertices drawn per frame
pub const QUAD_VERTEX_COUNT: u32 = 4;

/// Configuration file location
pub mod config {
    /// Directory name under the platform config dir
    pub const APP_DIR: &str = "camera-preview";

    /// Configuration file name
    pub const FILE_NAME: &str = "config.json";
}

/// Camera session timing
pub mod session {
    use super::Duration;

    /// Poll interval when waiting for the session to settle
    pub const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(2);

    /// Thread name of the camera callback worker
    pub const CALLBACK_THREAD_NAME: &str = "camera-callbacks";
}

/// Virtual camera defaults
pub mod virtual_camera {
    use super::Duration;

    /// Frame interval for generated frames (~30fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Sizes advertised by default, first entry is the one a session picks
    pub const DEFAULT_SIZES: [[u32; 2]; 3] = [[1920, 1080], [1280, 720], [640, 480]];

    /// Granularity of stop checks while the capture loop sleeps
    pub const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(5);
}

/// Headless runner defaults
pub mod runner {
    use super::Duration;

    /// Default display size (portrait phone)
    pub const DEFAULT_DISPLAY: [u32; 2] = [1080, 1920];

    /// Default number of frames rendered by `run`
    pub const DEFAULT_FRAMES: u64 = 120;

    /// Pacing between frames (~60Hz refresh)
    pub const FRAME_PERIOD: Duration = Duration::from_millis(16);
}
