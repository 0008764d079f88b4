// SPDX-License-Identifier: GPL-3.0-only

//! Frame presenter
//!
//! Runs once per display refresh on the render context. Every frame starts
//! with a clear. Geometry (rotation correction and viewport) is computed only
//! when the state machine asks for it and is then reused unchanged until the
//! next configuration change.

use super::state::{RenderState, RenderStateMachine};
use crate::backends::camera::SessionMonitor;
use crate::backends::display::{DisplayGeometry, DisplayHost};
use crate::geometry::{
    CameraOutputSize, DeviceMountModel, RotationClass, TextureCoordSet, ViewportRect,
    compute_viewport, resolve,
};
use crate::gpu::external_texture::{ImageConsumer, ImageProducer, image_stream};
use crate::gpu::{GpuError, PreviewRenderer, TextureId};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Everything derived from one display configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub rotation: RotationClass,
    pub tex_coords: TextureCoordSet,
    pub viewport: ViewportRect,
    /// Display state the geometry was computed for
    pub display: DisplayGeometry,
    pub camera: CameraOutputSize,
}

/// Run the orientation resolver and the viewport calculator together
pub fn compute_geometry(
    display: DisplayGeometry,
    mount: DeviceMountModel,
    camera: CameraOutputSize,
) -> Geometry {
    let rotation = resolve(display.rotation, mount);
    Geometry {
        rotation,
        tex_coords: rotation.tex_coords(),
        viewport: compute_viewport(display.pixel_width, display.pixel_height, camera),
        display,
        camera,
    }
}

/// What a call to [`FramePresenter::draw_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Clear only: camera not ready or geometry not current
    Idle,
    /// Configured, but no camera image has arrived yet
    AwaitingImage,
    /// The quad was drawn; `fresh` is false when the previous image was redrawn
    Drawn { fresh: bool },
}

pub struct FramePresenter<R: PreviewRenderer> {
    renderer: R,
    display: Arc<dyn DisplayHost>,
    mount: DeviceMountModel,
    clear_color: [f32; 4],
    texture: TextureId,
    consumer: ImageConsumer,
    session: Option<SessionMonitor>,
    state: RenderStateMachine,
    geometry: Option<Geometry>,
    has_image: bool,
    frames: u64,
}

impl<R: PreviewRenderer> FramePresenter<R> {
    /// Create the presenter and the image stream it reads
    ///
    /// The device mount model is derived here, once, from the display state at
    /// this instant. The returned producer goes to the camera session.
    pub fn new(
        mut renderer: R,
        display: Arc<dyn DisplayHost>,
        clear_color: [f32; 4],
    ) -> Result<(Self, ImageProducer), GpuError> {
        let declared = display.declared_orientation();
        let rotation = display.rotation();
        let mount = DeviceMountModel::derive(declared, rotation);
        info!(
            declared = %declared,
            rotation = %rotation,
            portrait_natural = mount.is_portrait_natural(),
            "Derived device mount model"
        );

        let texture = renderer.create_external_texture()?;
        let (producer, consumer) = image_stream(texture);

        let presenter = Self {
            renderer,
            display,
            mount,
            clear_color,
            texture,
            consumer,
            session: None,
            state: RenderStateMachine::new(),
            geometry: None,
            has_image: false,
            frames: 0,
        };
        Ok((presenter, producer))
    }

    /// Start following a camera session's ready flag
    pub fn bind_session(&mut self, monitor: SessionMonitor) {
        self.session = Some(monitor);
    }

    pub fn on_surface_created(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        self.renderer.surface_created(width, height)?;
        self.state.surface_created();
        Ok(())
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        self.renderer.surface_resized(width, height)?;
        self.state.surface_changed();
        debug!(width, height, state = %self.state.state(), "Surface changed");
        Ok(())
    }

    /// Render one frame
    pub fn draw_frame(&mut self) -> Result<FrameOutcome, GpuError> {
        self.frames += 1;
        self.renderer.clear(self.clear_color);

        let ready = self.session.as_ref().is_some_and(|s| s.is_ready());
        self.state.camera_ready_changed(ready);

        if self.state.needs_geometry() {
            self.recompute_geometry();
        }

        if !self.state.may_draw() {
            self.renderer.present()?;
            trace!(frame = self.frames, state = %self.state.state(), "Idle frame");
            return Ok(FrameOutcome::Idle);
        }

        let fresh = match self.consumer.update_tex_image() {
            Some(frame) => {
                self.renderer.upload_image(self.texture, &frame)?;
                self.has_image = true;
                true
            }
            None => false,
        };

        let Some(geometry) = self.geometry.filter(|_| self.has_image) else {
            self.renderer.present()?;
            return Ok(FrameOutcome::AwaitingImage);
        };

        self.renderer
            .draw_quad(self.texture, &geometry.viewport, &geometry.tex_coords)?;
        self.renderer.present()?;
        trace!(frame = self.frames, fresh, "Drew camera frame");
        Ok(FrameOutcome::Drawn { fresh })
    }

    fn recompute_geometry(&mut self) {
        let Some(camera) = self.session.as_ref().and_then(|s| s.output_size()) else {
            return;
        };
        let display_geom = self.display.geometry();
        let geometry = compute_geometry(display_geom, self.mount, camera);
        info!(
            rotation = %display_geom.rotation,
            display_width = display_geom.pixel_width,
            display_height = display_geom.pixel_height,
            camera = %camera,
            correction = %geometry.rotation,
            viewport = %geometry.viewport,
            "Computed preview geometry"
        );
        self.geometry = Some(geometry);
        self.state.geometry_computed();
    }

    pub fn state(&self) -> RenderState {
        self.state.state()
    }

    /// Geometry from the last configuration cycle, possibly stale
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Number of geometry computations so far
    pub fn geometry_generation(&self) -> u64 {
        self.state.generation()
    }

    pub fn mount(&self) -> DeviceMountModel {
        self.mount
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::display::DisplayRotation;

    #[test]
    fn test_compute_geometry_portrait_phone() {
        let display = DisplayGeometry {
            pixel_width: 1080,
            pixel_height: 1920,
            rotation: DisplayRotation::Rotation0,
        };
        let mount = DeviceMountModel::from_portrait_natural(true);
        let camera = CameraOutputSize::new(1920, 1080).unwrap();

        let geometry = compute_geometry(display, mount, camera);
        assert_eq!(geometry.rotation, RotationClass::Rotate270);
        assert_eq!(
            geometry.viewport,
            ViewportRect {
                x: 0,
                y: 656,
                width: 1080,
                height: 607
            }
        );
        assert_eq!(
            geometry.tex_coords,
            TextureCoordSet::for_rotation(RotationClass::Rotate270)
        );
    }
}
