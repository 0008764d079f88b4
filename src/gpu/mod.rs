// SPDX-License-Identifier: GPL-3.0-only

//! GPU seam for the preview
//!
//! The presenter only needs a handful of operations from the GPU: create an
//! external-image texture, upload the latest camera image into it, clear, draw
//! one textured quad into a viewport, and present. [`PreviewRenderer`] is that
//! surface. [`wgpu_renderer::WgpuRenderer`] implements it on an offscreen wgpu
//! target; [`recording::RecordingRenderer`] records the calls instead.

pub mod external_texture;
pub mod recording;
pub mod wgpu_renderer;

use crate::backends::camera::CameraFrame;
use crate::geometry::{TextureCoordSet, ViewportRect};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Opaque identifier of an external-image texture target
///
/// This is the only thing the camera producer and the GPU consumer share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// GPU resource failures
///
/// These are fatal to the render context. Nothing in the preview retries them.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(String),
    #[error("failed to create GPU device: {0}")]
    DeviceRequest(String),
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("render pipeline creation failed: {0}")]
    PipelineCreation(String),
    #[error("texture allocation failed: {0}")]
    TextureAllocation(String),
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),
    #[error("render surface has not been created")]
    NoSurface,
    #[error("camera image is malformed: {0}")]
    InvalidImage(String),
    #[error("frame readback failed: {0}")]
    Readback(String),
}

/// Operations the frame presenter drives on the render context
///
/// All calls happen on the render context, in order. A frame is one `clear`,
/// at most one `draw_quad`, then `present`.
pub trait PreviewRenderer {
    /// Allocate a texture that camera images are streamed into
    fn create_external_texture(&mut self) -> Result<TextureId, GpuError>;

    /// The render surface exists (again); (re)create size-dependent resources
    fn surface_created(&mut self, width: u32, height: u32) -> Result<(), GpuError>;

    /// The render surface changed size
    fn surface_resized(&mut self, width: u32, height: u32) -> Result<(), GpuError>;

    /// Clear the whole surface
    fn clear(&mut self, color: [f32; 4]);

    /// Advance the external texture to a new camera image
    fn upload_image(&mut self, texture: TextureId, frame: &CameraFrame) -> Result<(), GpuError>;

    /// Draw the full-screen quad sampling `texture` into `viewport`
    fn draw_quad(
        &mut self,
        texture: TextureId,
        viewport: &ViewportRect,
        tex_coords: &TextureCoordSet,
    ) -> Result<(), GpuError>;

    /// Finish the frame
    fn present(&mut self) -> Result<(), GpuError>;
}

/// Information about the created GPU device
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
}

/// Create a wgpu device and queue for preview rendering.
///
/// No surface is involved: the preview renders into an offscreen texture.
pub async fn create_render_device(
    label: &str,
) -> Result<(Arc<wgpu::Device>, Arc<wgpu::Queue>, GpuDeviceInfo), GpuError> {
    info!(label = label, "Creating GPU device for preview");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| GpuError::NoAdapter(e.to_string()))?;

    let adapter_info = adapter.get_info();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        "GPU adapter selected for preview"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

    debug!(label = label, "GPU device ready");

    let info = GpuDeviceInfo {
        adapter_name: adapter_info.name.clone(),
        backend: adapter_info.backend,
    };

    Ok((Arc::new(device), Arc::new(queue), info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_render_device() {
        // This test requires a GPU, so it may be skipped in CI
        match pollster::block_on(create_render_device("test_device")) {
            Ok((device, queue, info)) => {
                println!("Created device: {:?}", info);
                drop(queue);
                drop(device);
            }
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
            }
        }
    }

    #[test]
    fn test_texture_id_display() {
        assert_eq!(TextureId(7).to_string(), "tex#7");
    }
}
