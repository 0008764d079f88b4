// SPDX-License-Identifier: GPL-3.0-only

//! wgpu implementation of the preview renderer
//!
//! Renders into an offscreen RGBA target so the preview runs headless. Each
//! external texture owns a sampled GPU texture plus the bind group that reads
//! it; the texture is reallocated when the camera image size changes.
//!
//! A frame is recorded as a pending clear and an optional quad draw, and is
//! encoded into a single render pass on `present`.

use super::{GpuDeviceInfo, GpuError, PreviewRenderer, TextureId, create_render_device};
use crate::backends::camera::CameraFrame;
use crate::constants::{QUAD_VERTEX_COUNT, QUAD_VERTICES};
use crate::geometry::{RotationClass, TextureCoordSet, ViewportRect};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};
use wgpu::util::DeviceExt;

const PREVIEW_SHADER: &str = include_str!("../shaders/preview.wgsl");

/// Format of both the camera textures and the render target
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

/// Viewport placement for the vertex shader
///
/// `rect` is x, y, width, height in target pixels with a bottom-left origin.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewportUniform {
    rect: [f32; 4],
    target_size: [f32; 2],
    /// Padding for 16-byte alignment
    _padding: [f32; 2],
}

impl ViewportUniform {
    fn new(viewport: &ViewportRect, target: (u32, u32)) -> Self {
        Self {
            rect: [
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
            ],
            target_size: [target.0 as f32, target.1 as f32],
            _padding: [0.0; 2],
        }
    }
}

fn check_texture_extent(size: wgpu::Extent3d, max: u32) -> Result<(), GpuError> {
    if size.width > max || size.height > max {
        return Err(GpuError::TextureAllocation(format!(
            "{}x{} exceeds the device limit of {max}",
            size.width, size.height
        )));
    }
    Ok(())
}

struct ExternalTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

#[derive(Default)]
struct PendingFrame {
    clear: Option<[f32; 4]>,
    draw: Option<(TextureId, ViewportRect, TextureCoordSet)>,
}

pub struct WgpuRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    info: GpuDeviceInfo,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    position_buffer: wgpu::Buffer,
    tex_coord_buffer: wgpu::Buffer,
    textures: HashMap<TextureId, ExternalTexture>,
    next_texture: u32,
    target: Option<RenderTarget>,
    pending: PendingFrame,
    frames_presented: u64,
}

impl WgpuRenderer {
    /// Create a renderer on a freshly requested GPU device
    pub fn new() -> Result<Self, GpuError> {
        let (device, queue, info) = pollster::block_on(create_render_device("camera-preview"))?;
        Self::with_device(device, queue, info)
    }

    /// Create a renderer on an existing device
    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        info: GpuDeviceInfo,
    ) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("camera-preview shader"),
            source: wgpu::ShaderSource::Wgsl(PREVIEW_SHADER.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::ShaderCompile(err.to_string()));
        }

        // Bind group layout for camera texture, sampler, and viewport
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera-preview bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("camera-preview pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("camera-preview pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &POSITION_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &TEX_COORD_ATTRIBUTES,
                    },
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TEXTURE_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::PipelineCreation(err.to_string()));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("camera-preview sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera-preview viewport uniform"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-preview quad positions"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coord_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-preview quad texcoords"),
            contents: TextureCoordSet::for_rotation(RotationClass::Rotate0).as_bytes(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        info!(adapter = %info.adapter_name, backend = ?info.backend, "Preview pipeline created");

        Ok(Self {
            device,
            queue,
            info,
            pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
            position_buffer,
            tex_coord_buffer,
            textures: HashMap::new(),
            next_texture: 1,
            target: None,
            pending: PendingFrame::default(),
            frames_presented: 0,
        })
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        &self.info
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Allocate a 2D texture, reporting oversized or rejected textures as errors
    fn allocate_texture(
        &self,
        descriptor: &wgpu::TextureDescriptor<'_>,
    ) -> Result<wgpu::Texture, GpuError> {
        check_texture_extent(
            descriptor.size,
            self.device.limits().max_texture_dimension_2d,
        )?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self.device.create_texture(descriptor);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::TextureAllocation(err.to_string()));
        }
        Ok(texture)
    }

    fn create_sampled_texture(&self, width: u32, height: u32) -> Result<ExternalTexture, GpuError> {
        let texture = self.allocate_texture(&wgpu::TextureDescriptor {
            label: Some("camera-preview external texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera-preview bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(ExternalTexture {
            texture,
            bind_group,
            size: (width, height),
        })
    }

    fn create_target(&self, width: u32, height: u32) -> Result<RenderTarget, GpuError> {
        let width = width.max(1);
        let height = height.max(1);
        let texture = self.allocate_texture(&wgpu::TextureDescriptor {
            label: Some("camera-preview render target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(RenderTarget {
            texture,
            view,
            width,
            height,
        })
    }

    /// Read the last presented frame back from the GPU
    pub fn read_pixels(&self) -> Result<image::RgbaImage, GpuError> {
        let target = self.target.as_ref().ok_or(GpuError::NoSurface)?;
        let width = target.width;
        let height = target.height;

        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera-preview readback"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("camera-preview readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * bytes_per_row) as usize;
            let end = start + unpadded_bytes_per_row as usize;
            pixels.extend_from_slice(&data[start..end]);
        }
        drop(data);
        buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| GpuError::Readback("pixel buffer size mismatch".to_string()))
    }
}

impl PreviewRenderer for WgpuRenderer {
    fn create_external_texture(&mut self) -> Result<TextureId, GpuError> {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        // 1x1 placeholder until the first camera image arrives
        let texture = self.create_sampled_texture(1, 1)?;
        self.textures.insert(id, texture);
        debug!(texture = %id, "Created external texture");
        Ok(id)
    }

    fn surface_created(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        self.target = Some(self.create_target(width, height)?);
        self.pending = PendingFrame::default();
        info!(width, height, "Render surface created");
        Ok(())
    }

    fn surface_resized(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if self.target.is_none() {
            return Err(GpuError::NoSurface);
        }
        self.target = Some(self.create_target(width, height)?);
        debug!(width, height, "Render surface resized");
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.pending.clear = Some(color);
    }

    fn upload_image(&mut self, texture: TextureId, frame: &CameraFrame) -> Result<(), GpuError> {
        let current_size = self
            .textures
            .get(&texture)
            .map(|t| t.size)
            .ok_or(GpuError::UnknownTexture(texture))?;

        if !frame.is_complete() || frame.width == 0 || frame.height == 0 {
            return Err(GpuError::InvalidImage(format!(
                "{}x{} image, stride {}, {} bytes",
                frame.width,
                frame.height,
                frame.stride,
                frame.data.len()
            )));
        }

        if current_size != (frame.width, frame.height) {
            debug!(
                texture = %texture,
                width = frame.width,
                height = frame.height,
                "Reallocating external texture for new image size"
            );
            let replacement = self.create_sampled_texture(frame.width, frame.height)?;
            self.textures.insert(texture, replacement);
        }

        let entry = self
            .textures
            .get(&texture)
            .ok_or(GpuError::UnknownTexture(texture))?;
        let len = frame.stride as usize * frame.height as usize;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data[..len],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.stride),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
        trace!(texture = %texture, sequence = frame.sequence, "Uploaded camera image");
        Ok(())
    }

    fn draw_quad(
        &mut self,
        texture: TextureId,
        viewport: &ViewportRect,
        tex_coords: &TextureCoordSet,
    ) -> Result<(), GpuError> {
        if !self.textures.contains_key(&texture) {
            return Err(GpuError::UnknownTexture(texture));
        }
        self.pending.draw = Some((texture, *viewport, *tex_coords));
        Ok(())
    }

    fn present(&mut self) -> Result<(), GpuError> {
        let target = self.target.as_ref().ok_or(GpuError::NoSurface)?;
        let pending = std::mem::take(&mut self.pending);

        let draw = match pending.draw {
            Some((texture, viewport, tex_coords)) => {
                let entry = self
                    .textures
                    .get(&texture)
                    .ok_or(GpuError::UnknownTexture(texture))?;
                let uniform = ViewportUniform::new(&viewport, (target.width, target.height));
                self.queue
                    .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
                self.queue
                    .write_buffer(&self.tex_coord_buffer, 0, tex_coords.as_bytes());
                Some(&entry.bind_group)
            }
            None => None,
        };

        let load = match pending.clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("camera-preview frame encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("camera-preview render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(bind_group) = draw {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.position_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.tex_coord_buffer.slice(..));
                render_pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validate that a WGSL shader compiles successfully using naga
    fn validate_shader(name: &str, source: &str) {
        let result = naga::front::wgsl::parse_str(source);
        match result {
            Ok(module) => {
                let info = naga::valid::Validator::new(
                    naga::valid::ValidationFlags::all(),
                    naga::valid::Capabilities::all(),
                )
                .validate(&module);

                if let Err(e) = info {
                    panic!("Shader '{}' validation failed: {:?}", name, e);
                }
            }
            Err(e) => {
                panic!("Shader '{}' parse failed: {:?}", name, e);
            }
        }
    }

    #[test]
    fn test_preview_shader_valid() {
        validate_shader("preview", PREVIEW_SHADER);
    }

    #[test]
    fn test_viewport_uniform_layout() {
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 32);
        let viewport = ViewportRect {
            x: -240,
            y: 0,
            width: 1920,
            height: 1080,
        };
        let uniform = ViewportUniform::new(&viewport, (1440, 1080));
        assert_eq!(uniform.rect, [-240.0, 0.0, 1920.0, 1080.0]);
        assert_eq!(uniform.target_size, [1440.0, 1080.0]);
    }

    #[test]
    fn test_texture_extent_limit() {
        let extent = |width, height| wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        assert!(check_texture_extent(extent(2048, 2048), 2048).is_ok());
        assert!(matches!(
            check_texture_extent(extent(100_000, 10), 8192),
            Err(GpuError::TextureAllocation(_))
        ));
        assert!(check_texture_extent(extent(10, 8193), 8192).is_err());
    }

    fn renderer_or_skip() -> Option<WgpuRenderer> {
        // This test requires a GPU, so it may be skipped in CI
        match WgpuRenderer::new() {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                None
            }
        }
    }

    #[test]
    fn test_clear_only_frame() {
        let Some(mut renderer) = renderer_or_skip() else {
            return;
        };
        renderer.surface_created(8, 8).unwrap();
        renderer.clear([0.0, 0.0, 1.0, 1.0]);
        renderer.present().unwrap();

        let image = renderer.read_pixels().unwrap();
        assert_eq!(image.get_pixel(4, 4).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_quad_covers_viewport() {
        let Some(mut renderer) = renderer_or_skip() else {
            return;
        };
        renderer.surface_created(8, 8).unwrap();
        let texture = renderer.create_external_texture().unwrap();

        let red: Vec<u8> = [255u8, 0, 0, 255].repeat(4);
        let frame = CameraFrame::from_rgba(2, 2, Arc::from(red), 0);
        renderer.upload_image(texture, &frame).unwrap();

        let viewport = ViewportRect {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
        };
        renderer.clear([0.0, 0.0, 0.0, 1.0]);
        renderer
            .draw_quad(
                texture,
                &viewport,
                &TextureCoordSet::for_rotation(RotationClass::Rotate0),
            )
            .unwrap();
        renderer.present().unwrap();

        let image = renderer.read_pixels().unwrap();
        assert_eq!(image.get_pixel(4, 4).0, [255, 0, 0, 255]);
        assert_eq!(renderer.frames_presented(), 1);
    }

    #[test]
    fn test_unknown_texture_is_error() {
        let Some(mut renderer) = renderer_or_skip() else {
            return;
        };
        let frame = CameraFrame::from_rgba(1, 1, Arc::from(vec![0u8; 4]), 0);
        assert!(matches!(
            renderer.upload_image(TextureId(99), &frame),
            Err(GpuError::UnknownTexture(_))
        ));
    }

    #[test]
    fn test_oversized_surface_is_error() {
        let Some(mut renderer) = renderer_or_skip() else {
            return;
        };
        let max = renderer.device.limits().max_texture_dimension_2d;
        assert!(matches!(
            renderer.surface_created(max + 1, 10),
            Err(GpuError::TextureAllocation(_))
        ));

        renderer.surface_created(8, 8).unwrap();
        assert!(matches!(
            renderer.surface_resized(10, max + 1),
            Err(GpuError::TextureAllocation(_))
        ));
    }

    #[test]
    fn test_oversized_camera_image_is_error() {
        let Some(mut renderer) = renderer_or_skip() else {
            return;
        };
        let texture = renderer.create_external_texture().unwrap();
        let width = renderer.device.limits().max_texture_dimension_2d + 1;
        let frame = CameraFrame::from_rgba(width, 1, Arc::from(vec![0u8; width as usize * 4]), 0);
        assert!(matches!(
            renderer.upload_image(texture, &frame),
            Err(GpuError::TextureAllocation(_))
        ));
    }
}
