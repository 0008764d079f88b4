// SPDX-License-Identifier: GPL-3.0-only

//! Viewport/crop calculator
//!
//! The camera image is always treated as landscape-native; rotation happens
//! in texture space, never by swapping dimensions here. The image is scaled
//! uniformly so it spans the display along the fitted axis:
//!
//! - landscape display: camera height fills display height, centred horizontally
//! - portrait or square display: camera width fills display width, centred vertically
//!
//! The other axis may overflow the display. The origin then goes negative and
//! the GPU clips the excess symmetrically, which is the crop.

use serde::{Deserialize, Serialize};

/// Camera output size in sensor-native pixels
///
/// Both dimensions are non-zero by construction. Sessions only build one from
/// a size the device actually advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct CameraOutputSize {
    width: u32,
    height: u32,
}

impl CameraOutputSize {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Pack into a single word for lock-free publication (never zero)
    pub(crate) fn pack(&self) -> u64 {
        (u64::from(self.width) << 32) | u64::from(self.height)
    }

    pub(crate) fn unpack(packed: u64) -> Option<Self> {
        Self::new((packed >> 32) as u32, packed as u32)
    }
}

impl TryFrom<[u32; 2]> for CameraOutputSize {
    type Error = String;

    fn try_from(value: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
            .ok_or_else(|| format!("invalid camera size {}x{}", value[0], value[1]))
    }
}

impl From<CameraOutputSize> for [u32; 2] {
    fn from(size: CameraOutputSize) -> Self {
        [size.width, size.height]
    }
}

impl std::fmt::Display for CameraOutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for CameraOutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
        let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
        Self::new(width, height).ok_or_else(|| format!("size must be non-zero, got '{s}'"))
    }
}

/// Viewport in display pixels
///
/// The origin follows GPU viewport conventions and may be negative when the
/// scaled image overflows the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ViewportRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// Compute the centred, aspect-preserving viewport for the camera image
///
/// Scaled sizes truncate toward zero and never drop below one pixel. Display
/// dimensions of zero are treated as one pixel.
pub fn compute_viewport(
    display_width: u32,
    display_height: u32,
    camera: CameraOutputSize,
) -> ViewportRect {
    let dw = u64::from(display_width.max(1));
    let dh = u64::from(display_height.max(1));
    let cw = u64::from(camera.width);
    let ch = u64::from(camera.height);

    // Integer form of floor(scale * dimension) with scale = display / camera
    let (width, height) = if dw > dh {
        (cw * dh / ch, dh)
    } else {
        (dw, ch * dw / cw)
    };

    let width = clamp_dimension(width);
    let height = clamp_dimension(height);

    ViewportRect {
        x: centre_origin(dw, width),
        y: centre_origin(dh, height),
        width,
        height,
    }
}

fn clamp_dimension(value: u64) -> u32 {
    value.clamp(1, u64::from(u32::MAX)) as u32
}

fn centre_origin(display: u64, size: u32) -> i32 {
    // Division truncates toward zero, matching integer viewport math on the GPU side
    let offset = (display as i64 - i64::from(size)) / 2;
    offset.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
