// SPDX-License-Identifier: GPL-3.0-only

//! Shared test backend

#![allow(dead_code)]

use camera_preview::backends::camera::{
    BackendResult, CameraBackend, CameraBackendType, CameraCallbacks, CameraDevice,
    CaptureRequest, DeviceHandle, LensFacing, SessionHandle,
};
use camera_preview::geometry::CameraOutputSize;
use camera_preview::gpu::external_texture::ImageProducer;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that holds on to the open callbacks until the test answers
pub struct ScriptedBackend {
    size: CameraOutputSize,
    pending: Mutex<Option<CameraCallbacks>>,
    closes: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: CameraOutputSize::new(width, height).unwrap(),
            pending: Mutex::new(None),
            closes: AtomicUsize::new(0),
        }
    }

    /// Callbacks handed over by the last `open`
    pub fn take_callbacks(&self) -> Option<CameraCallbacks> {
        self.pending.lock().unwrap().take()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl CameraBackend for ScriptedBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(vec![CameraDevice {
            id: "scripted".to_string(),
            name: "Scripted".to_string(),
            facing: LensFacing::Back,
        }])
    }

    fn output_sizes(&self, _device: &CameraDevice) -> BackendResult<Vec<CameraOutputSize>> {
        Ok(vec![self.size])
    }

    fn open(&self, _device: &CameraDevice, callbacks: CameraCallbacks) -> BackendResult<()> {
        *self.pending.lock().unwrap() = Some(callbacks);
        Ok(())
    }

    fn create_capture_session(
        &self,
        _device: DeviceHandle,
        _target: ImageProducer,
        _callbacks: CameraCallbacks,
    ) -> BackendResult<()> {
        Ok(())
    }

    fn set_repeating_request(
        &self,
        _session: SessionHandle,
        _request: CaptureRequest,
    ) -> BackendResult<()> {
        Ok(())
    }

    fn close(&self, _device: DeviceHandle) -> BackendResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
