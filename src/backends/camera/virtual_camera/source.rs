// SPDX-License-Identifier: GPL-3.0-only

//! Pixel sources for the virtual camera
//!
//! Frames are produced once per stream and shared between all frames of that
//! stream, so the capture loop only stamps sequence numbers.

use crate::backends::camera::{BackendError, BackendResult};
use crate::config::VirtualSource;
use crate::geometry::CameraOutputSize;
use image::imageops::FilterType;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Quadrant colours, clockwise from the top-left
const QUADRANT_COLORS: [[u8; 4]; 4] = [
    [220, 40, 40, 255],  // top-left: red
    [40, 180, 60, 255],  // top-right: green
    [240, 220, 40, 255], // bottom-right: yellow
    [40, 80, 220, 255],  // bottom-left: blue
];

const MARKER_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Render the configured source at `size` as tightly packed RGBA
pub fn render_source(source: &VirtualSource, size: CameraOutputSize) -> BackendResult<Arc<[u8]>> {
    match source {
        VirtualSource::TestPattern => Ok(test_pattern(size)),
        VirtualSource::Image { path } => load_image(path, size),
    }
}

/// Coloured quadrants with an upward-pointing arrow at the top centre
///
/// Which corner ends up where on screen shows the applied correction at a
/// glance; the arrow marks the sensor's top edge.
pub fn test_pattern(size: CameraOutputSize) -> Arc<[u8]> {
    let width = size.width();
    let height = size.height();
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);

    let half_w = width / 2;
    let half_h = height / 2;
    let marker_h = (height / 4).max(1);
    let marker_half_w = (width / 8).max(1);

    for y in 0..height {
        for x in 0..width {
            let color = if in_arrow(x, y, half_w, marker_h, marker_half_w) {
                MARKER_COLOR
            } else {
                let quadrant = match (x >= half_w, y >= half_h) {
                    (false, false) => 0,
                    (true, false) => 1,
                    (true, true) => 2,
                    (false, true) => 3,
                };
                QUADRANT_COLORS[quadrant]
            };
            data.extend_from_slice(&color);
        }
    }

    Arc::from(data)
}

/// Triangle with its apex at the top centre, widening downwards
fn in_arrow(x: u32, y: u32, centre_x: u32, marker_h: u32, marker_half_w: u32) -> bool {
    if y >= marker_h {
        return false;
    }
    let reach = u64::from(marker_half_w) * u64::from(y) / u64::from(marker_h);
    u64::from(x.abs_diff(centre_x)) <= reach
}

/// Load an image file and scale it to the stream size
///
/// Supports common image formats: PNG, JPEG, GIF, BMP, WebP
pub fn load_image(path: &Path, size: CameraOutputSize) -> BackendResult<Arc<[u8]>> {
    info!(path = %path.display(), size = %size, "Loading virtual camera image");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img
        .resize_exact(size.width(), size.height(), FilterType::Triangle)
        .to_rgba8();
    Ok(Arc::from(rgba.into_raw()))
}
