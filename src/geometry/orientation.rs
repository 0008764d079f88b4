// SPDX-License-Identifier: GPL-3.0-only

//! Orientation resolver
//!
//! Maps the current display rotation onto the correction that makes the
//! rear camera image appear upright. Rear sensors are mounted landscape-native,
//! so the correction depends on whether the device's natural orientation is
//! portrait or landscape, captured once at startup in [`DeviceMountModel`].
//!
//! The correction is applied purely through texture coordinates: each
//! [`RotationClass`] selects one fixed permutation of the unit-square corners
//! for the four vertices of the full-screen quad.

use crate::backends::display::{DeclaredOrientation, DisplayRotation};
use serde::{Deserialize, Serialize};

/// Rotation applied to sampled texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationClass {
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl RotationClass {
    pub const ALL: [RotationClass; 4] = [
        RotationClass::Rotate0,
        RotationClass::Rotate90,
        RotationClass::Rotate180,
        RotationClass::Rotate270,
    ];

    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            RotationClass::Rotate0 => 0,
            RotationClass::Rotate90 => 90,
            RotationClass::Rotate180 => 180,
            RotationClass::Rotate270 => 270,
        }
    }

    /// Texture coordinates for the quad under this rotation
    pub fn tex_coords(&self) -> TextureCoordSet {
        TextureCoordSet::for_rotation(*self)
    }
}

impl std::fmt::Display for RotationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Whether the device's natural orientation is portrait
///
/// Derived once from the declared orientation and the rotation observed at
/// that same instant. A portrait-declared app at 0° or 180° is running on a
/// portrait-natural device; a landscape-declared app at 90° or 270° is too.
/// Never re-derive this mid-session: the rotation table row it selects must
/// stay fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMountModel {
    portrait_natural: bool,
}

impl DeviceMountModel {
    pub fn derive(declared: DeclaredOrientation, rotation: DisplayRotation) -> Self {
        let upright_or_inverted = matches!(
            rotation,
            DisplayRotation::Rotation0 | DisplayRotation::Rotation180
        );
        let portrait_natural = match declared {
            DeclaredOrientation::Portrait => upright_or_inverted,
            DeclaredOrientation::Landscape => !upright_or_inverted,
        };
        Self { portrait_natural }
    }

    pub fn from_portrait_natural(portrait_natural: bool) -> Self {
        Self { portrait_natural }
    }

    pub fn is_portrait_natural(&self) -> bool {
        self.portrait_natural
    }

    /// Correction table row for this device, indexed by display quadrant
    pub fn rotation_table(&self) -> &'static [RotationClass; 4] {
        if self.portrait_natural {
            &PORTRAIT_NATURAL_TABLE
        } else {
            &LANDSCAPE_NATURAL_TABLE
        }
    }
}

// Fixed for rear-facing, landscape-mounted sensors. A different sensor mount
// needs these rows re-derived.
const PORTRAIT_NATURAL_TABLE: [RotationClass; 4] = [
    RotationClass::Rotate270,
    RotationClass::Rotate0,
    RotationClass::Rotate90,
    RotationClass::Rotate180,
];

const LANDSCAPE_NATURAL_TABLE: [RotationClass; 4] = [
    RotationClass::Rotate0,
    RotationClass::Rotate90,
    RotationClass::Rotate180,
    RotationClass::Rotate270,
];

/// Resolve the image correction for the current display rotation
pub fn resolve(rotation: DisplayRotation, mount: DeviceMountModel) -> RotationClass {
    mount.rotation_table()[rotation.quadrant()]
}

/// Texture coordinates for the four quad vertices
///
/// Vertex order matches [`crate::constants::QUAD_VERTICES`]: top-left,
/// bottom-left, top-right, bottom-right (triangle strip).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextureCoordSet {
    pub coords: [[f32; 2]; 4],
}

const TEX_COORDS_0: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
const TEX_COORDS_90: [[f32; 2]; 4] = [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const TEX_COORDS_180: [[f32; 2]; 4] = [[1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
const TEX_COORDS_270: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

impl TextureCoordSet {
    pub fn for_rotation(rotation: RotationClass) -> Self {
        let coords = match rotation {
            RotationClass::Rotate0 => TEX_COORDS_0,
            RotationClass::Rotate90 => TEX_COORDS_90,
            RotationClass::Rotate180 => TEX_COORDS_180,
            RotationClass::Rotate270 => TEX_COORDS_270,
        };
        Self { coords }
    }

    /// Flattened (u, v) pairs, ready for a vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_model_derivation() {
        use DeclaredOrientation::*;
        use DisplayRotation::*;

        assert!(DeviceMountModel::derive(Portrait, Rotation0).is_portrait_natural());
        assert!(DeviceMountModel::derive(Portrait, Rotation180).is_portrait_natural());
        assert!(!DeviceMountModel::derive(Portrait, Rotation90).is_portrait_natural());
        assert!(DeviceMountModel::derive(Landscape, Rotation90).is_portrait_natural());
        assert!(DeviceMountModel::derive(Landscape, Rotation270).is_portrait_natural());
        assert!(!DeviceMountModel::derive(Landscape, Rotation0).is_portrait_natural());
    }

    #[test]
    fn test_portrait_row_shifts_by_minus_quarter_turn() {
        let mount = DeviceMountModel::from_portrait_natural(true);
        for rotation in DisplayRotation::ALL {
            let resolved = resolve(rotation, mount);
            assert_eq!(
                (resolved.degrees() + 360 - rotation.degrees()) % 360,
                270,
                "display {rotation} resolved to {resolved}"
            );
        }
    }

    #[test]
    fn test_rotation_zero_is_identity_permutation() {
        assert_eq!(RotationClass::Rotate0.tex_coords().coords, TEX_COORDS_0);
    }
}
