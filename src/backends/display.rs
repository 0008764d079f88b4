// SPDX-License-Identifier: GPL-3.0-only

//! Host display seam
//!
//! The presenter never caches display state beyond one configuration cycle.
//! It asks a [`DisplayHost`] for the current rotation and pixel size whenever
//! geometry has to be recomputed.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Display rotation, clockwise from the device's natural orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DisplayRotation {
    /// All quadrants in clockwise order
    pub const ALL: [DisplayRotation; 4] = [
        DisplayRotation::Rotation0,
        DisplayRotation::Rotation90,
        DisplayRotation::Rotation180,
        DisplayRotation::Rotation270,
    ];

    /// Parse a rotation from degrees. Only exact quadrants are accepted.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(DisplayRotation::Rotation0),
            90 => Some(DisplayRotation::Rotation90),
            180 => Some(DisplayRotation::Rotation180),
            270 => Some(DisplayRotation::Rotation270),
            _ => None,
        }
    }

    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        self.quadrant() as u32 * 90
    }

    /// Quadrant index (0..=3), used to index rotation tables
    pub fn quadrant(&self) -> usize {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 1,
            DisplayRotation::Rotation180 => 2,
            DisplayRotation::Rotation270 => 3,
        }
    }

    fn from_quadrant(quadrant: u8) -> Self {
        Self::ALL[usize::from(quadrant % 4)]
    }
}

impl std::fmt::Display for DisplayRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Orientation the application declares for its layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredOrientation {
    #[default]
    Portrait,
    Landscape,
}

impl std::fmt::Display for DeclaredOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclaredOrientation::Portrait => write!(f, "portrait"),
            DeclaredOrientation::Landscape => write!(f, "landscape"),
        }
    }
}

impl std::str::FromStr for DeclaredOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(DeclaredOrientation::Portrait),
            "landscape" => Ok(DeclaredOrientation::Landscape),
            other => Err(format!("unknown orientation '{other}'")),
        }
    }
}

/// Snapshot of the display, read fresh for each resolution cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub rotation: DisplayRotation,
}

/// Values the host window/display system exposes on demand
pub trait DisplayHost: Send + Sync {
    /// Current rotation of the display
    fn rotation(&self) -> DisplayRotation;

    /// Current display size in pixels (width, height)
    fn pixel_size(&self) -> (u32, u32);

    /// Orientation declared by the application
    fn declared_orientation(&self) -> DeclaredOrientation;

    /// Read rotation and size together
    fn geometry(&self) -> DisplayGeometry {
        let (pixel_width, pixel_height) = self.pixel_size();
        DisplayGeometry {
            pixel_width,
            pixel_height,
            rotation: self.rotation(),
        }
    }
}

/// Display host whose state is set programmatically
///
/// Used by the headless runner and by tests to play the part of the window
/// system. Size and rotation are independent atomics; a reader may observe a
/// new rotation with the old size for one cycle, which the render state
/// machine tolerates.
#[derive(Debug)]
pub struct SimulatedDisplay {
    /// Width in the high 32 bits, height in the low 32 bits
    size: AtomicU64,
    rotation: AtomicU8,
    declared: DeclaredOrientation,
}

impl SimulatedDisplay {
    pub fn new(
        width: u32,
        height: u32,
        rotation: DisplayRotation,
        declared: DeclaredOrientation,
    ) -> Self {
        Self {
            size: AtomicU64::new(pack_size(width, height)),
            rotation: AtomicU8::new(rotation.quadrant() as u8),
            declared,
        }
    }

    pub fn set_pixel_size(&self, width: u32, height: u32) {
        self.size.store(pack_size(width, height), Ordering::Release);
    }

    pub fn set_rotation(&self, rotation: DisplayRotation) {
        self.rotation
            .store(rotation.quadrant() as u8, Ordering::Release);
    }

    /// Rotate the device by a quarter turn clockwise, swapping width and height
    pub fn rotate_quarter_turn(&self) -> DisplayRotation {
        let next = DisplayRotation::from_quadrant(self.rotation().quadrant() as u8 + 1);
        let (width, height) = self.pixel_size();
        self.set_pixel_size(height, width);
        self.set_rotation(next);
        next
    }
}

impl DisplayHost for SimulatedDisplay {
    fn rotation(&self) -> DisplayRotation {
        DisplayRotation::from_quadrant(self.rotation.load(Ordering::Acquire))
    }

    fn pixel_size(&self) -> (u32, u32) {
        let packed = self.size.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }

    fn declared_orientation(&self) -> DeclaredOrientation {
        self.declared
    }
}

fn pack_size(width: u32, height: u32) -> u64 {
    (u64::from(width) << 32) | u64::from(height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(
            DisplayRotation::from_degrees(90),
            Some(DisplayRotation::Rotation90)
        );
        assert_eq!(DisplayRotation::from_degrees(45), None);
        assert_eq!(DisplayRotation::from_degrees(360), None);
        for rotation in DisplayRotation::ALL {
            assert_eq!(DisplayRotation::from_degrees(rotation.degrees()), Some(rotation));
        }
    }

    #[test]
    fn test_quarter_turn_swaps_size() {
        let display = SimulatedDisplay::new(
            1080,
            1920,
            DisplayRotation::Rotation270,
            DeclaredOrientation::Portrait,
        );
        let next = display.rotate_quarter_turn();
        assert_eq!(next, DisplayRotation::Rotation0);
        assert_eq!(display.pixel_size(), (1920, 1080));
        assert_eq!(display.geometry().rotation, DisplayRotation::Rotation0);
    }

    #[test]
    fn test_declared_orientation_parse() {
        assert_eq!(
            "Landscape".parse::<DeclaredOrientation>(),
            Ok(DeclaredOrientation::Landscape)
        );
        assert!("sideways".parse::<DeclaredOrientation>().is_err());
    }
}
