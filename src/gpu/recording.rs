// SPDX-License-Identifier: GPL-3.0-only

//! Renderer that records calls instead of touching a GPU
//!
//! Used by `camera-preview run --dry-run` and by the presenter tests.

use super::{GpuError, PreviewRenderer, TextureId};
use crate::backends::camera::CameraFrame;
use crate::geometry::{TextureCoordSet, ViewportRect};
use tracing::trace;

/// One recorded renderer call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateTexture(TextureId),
    SurfaceCreated { width: u32, height: u32 },
    SurfaceResized { width: u32, height: u32 },
    Clear([f32; 4]),
    Upload { texture: TextureId, sequence: u64 },
    Draw {
        texture: TextureId,
        viewport: ViewportRect,
        tex_coords: TextureCoordSet,
    },
    Present,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Vec<RenderCall>,
    surface: Option<(u32, u32)>,
    textures: Vec<TextureId>,
    next_texture: u32,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            next_texture: 1,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn draws(&self) -> impl Iterator<Item = &RenderCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Draw { .. }))
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    pub fn present_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Present))
            .count()
    }

    fn check_texture(&self, texture: TextureId) -> Result<(), GpuError> {
        if self.textures.contains(&texture) {
            Ok(())
        } else {
            Err(GpuError::UnknownTexture(texture))
        }
    }
}

impl PreviewRenderer for RecordingRenderer {
    fn create_external_texture(&mut self) -> Result<TextureId, GpuError> {
        let id = TextureId(self.next_texture.max(1));
        self.next_texture = id.0 + 1;
        self.textures.push(id);
        self.calls.push(RenderCall::CreateTexture(id));
        Ok(id)
    }

    fn surface_created(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        self.surface = Some((width, height));
        self.calls.push(RenderCall::SurfaceCreated { width, height });
        Ok(())
    }

    fn surface_resized(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if self.surface.is_none() {
            return Err(GpuError::NoSurface);
        }
        self.surface = Some((width, height));
        self.calls.push(RenderCall::SurfaceResized { width, height });
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(RenderCall::Clear(color));
    }

    fn upload_image(&mut self, texture: TextureId, frame: &CameraFrame) -> Result<(), GpuError> {
        self.check_texture(texture)?;
        if !frame.is_complete() {
            return Err(GpuError::InvalidImage(format!(
                "{}x{} image with {} bytes",
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }
        trace!(texture = %texture, sequence = frame.sequence, "Recorded upload");
        self.calls.push(RenderCall::Upload {
            texture,
            sequence: frame.sequence,
        });
        Ok(())
    }

    fn draw_quad(
        &mut self,
        texture: TextureId,
        viewport: &ViewportRect,
        tex_coords: &TextureCoordSet,
    ) -> Result<(), GpuError> {
        self.check_texture(texture)?;
        self.calls.push(RenderCall::Draw {
            texture,
            viewport: *viewport,
            tex_coords: *tex_coords,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), GpuError> {
        if self.surface.is_none() {
            return Err(GpuError::NoSurface);
        }
        self.calls.push(RenderCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_requires_surface() {
        let mut renderer = RecordingRenderer::new();
        assert!(matches!(renderer.present(), Err(GpuError::NoSurface)));
        renderer.surface_created(10, 10).unwrap();
        assert!(renderer.present().is_ok());
        assert_eq!(renderer.present_count(), 1);
    }

    #[test]
    fn test_unknown_texture_rejected() {
        let mut renderer = RecordingRenderer::new();
        let viewport = ViewportRect {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        let coords = TextureCoordSet::for_rotation(crate::geometry::RotationClass::Rotate0);
        let result = renderer.draw_quad(TextureId(9), &viewport, &coords);
        assert!(matches!(result, Err(GpuError::UnknownTexture(TextureId(9)))));
    }
}
