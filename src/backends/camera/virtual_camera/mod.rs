// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! A software [`CameraBackend`] so the whole preview runs without hardware.
//! Devices and their sizes come from the configuration; frames are a test
//! pattern or a still image pushed into the image stream by a paced capture
//! loop. [`VirtualFaults`] injects the failures real devices produce.

pub mod source;

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraCallbacks, CameraDevice,
    CameraFrame, CaptureRequest, DeviceErrorKind, DeviceHandle, SessionHandle,
};
use crate::config::{VirtualCameraSettings, VirtualSource};
use crate::geometry::CameraOutputSize;
use crate::gpu::external_texture::ImageProducer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How an injected open failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFault {
    /// `open` is accepted, then an in-use error callback arrives
    Busy,
    /// `open` is refused synchronously
    Denied,
}

/// Failures to inject into the virtual camera
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualFaults {
    pub open: Option<OpenFault>,
    /// Report capture session configuration as failed
    pub fail_configure: bool,
    /// Disconnect after delivering this many frames
    pub disconnect_after_frames: Option<u64>,
}

struct VirtualDevice {
    device: CameraDevice,
    sizes: Vec<CameraOutputSize>,
}

struct OpenDevice {
    index: usize,
    callbacks: CameraCallbacks,
    session: Option<(SessionHandle, ImageProducer)>,
    capture: Option<CaptureLoopController>,
}

#[derive(Default)]
struct Inner {
    next_handle: u64,
    open: HashMap<DeviceHandle, OpenDevice>,
}

impl Inner {
    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

pub struct VirtualCameraBackend {
    devices: Vec<VirtualDevice>,
    source: VirtualSource,
    interval: Duration,
    faults: VirtualFaults,
    inner: Mutex<Inner>,
    frames_delivered: Arc<AtomicU64>,
}

impl VirtualCameraBackend {
    pub fn from_settings(settings: &VirtualCameraSettings) -> BackendResult<Self> {
        if settings.devices.is_empty() {
            return Err(BackendError::NotAvailable(
                "virtual camera has no devices configured".to_string(),
            ));
        }

        let devices = settings
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| VirtualDevice {
                device: CameraDevice {
                    id: format!("virtual:{i}"),
                    name: d.name.clone(),
                    facing: d.facing,
                },
                sizes: d.sizes.clone(),
            })
            .collect();

        Ok(Self {
            devices,
            source: settings.source.clone(),
            interval: Duration::from_millis(settings.frame_interval_ms.max(1)),
            faults: VirtualFaults::default(),
            inner: Mutex::new(Inner::default()),
            frames_delivered: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn with_faults(mut self, faults: VirtualFaults) -> Self {
        self.faults = faults;
        self
    }

    /// Frames pushed into image streams so far
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    /// Devices currently held open
    pub fn open_device_count(&self) -> usize {
        self.lock().open.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find(&self, device: &CameraDevice) -> BackendResult<usize> {
        self.devices
            .iter()
            .position(|d| d.device.id == device.id)
            .ok_or_else(|| BackendError::DeviceNotFound(device.id.clone()))
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(self.devices.iter().map(|d| d.device.clone()).collect())
    }

    fn output_sizes(&self, device: &CameraDevice) -> BackendResult<Vec<CameraOutputSize>> {
        let index = self.find(device)?;
        Ok(self.devices[index].sizes.clone())
    }

    fn open(&self, device: &CameraDevice, callbacks: CameraCallbacks) -> BackendResult<()> {
        let index = self.find(device)?;

        match self.faults.open {
            Some(OpenFault::Denied) => {
                return Err(BackendError::AccessDenied(device.name.clone()));
            }
            Some(OpenFault::Busy) => {
                callbacks.error(DeviceErrorKind::InUse);
                return Ok(());
            }
            None => {}
        }

        let mut inner = self.lock();
        if inner.open.values().any(|d| d.index == index) {
            debug!(device = %device.name, "Virtual device already open");
            callbacks.error(DeviceErrorKind::InUse);
            return Ok(());
        }

        let handle = DeviceHandle(inner.allocate());
        inner.open.insert(
            handle,
            OpenDevice {
                index,
                callbacks: callbacks.clone(),
                session: None,
                capture: None,
            },
        );
        drop(inner);

        info!(device = %device.name, ?handle, "Virtual camera opened");
        callbacks.opened(handle);
        Ok(())
    }

    fn create_capture_session(
        &self,
        device: DeviceHandle,
        target: ImageProducer,
        callbacks: CameraCallbacks,
    ) -> BackendResult<()> {
        let mut inner = self.lock();
        if !inner.open.contains_key(&device) {
            return Err(BackendError::InvalidHandle(format!("{device:?}")));
        }

        if self.faults.fail_configure {
            drop(inner);
            callbacks.configure_failed();
            return Ok(());
        }

        let session = SessionHandle(inner.allocate());
        if let Some(open) = inner.open.get_mut(&device) {
            open.session = Some((session, target));
        }
        drop(inner);

        debug!(?device, ?session, "Virtual capture session configured");
        callbacks.configured(session);
        Ok(())
    }

    fn set_repeating_request(
        &self,
        session: SessionHandle,
        request: CaptureRequest,
    ) -> BackendResult<()> {
        let mut inner = self.lock();
        let open = inner
            .open
            .values_mut()
            .find(|d| matches!(&d.session, Some((s, _)) if *s == session))
            .ok_or_else(|| BackendError::InvalidHandle(format!("{session:?}")))?;

        let Some((_, target)) = open.session.clone() else {
            return Err(BackendError::InvalidHandle(format!("{session:?}")));
        };
        if request.target != target.texture_id() {
            return Err(BackendError::ConfigureFailed(format!(
                "request targets {} but session streams into {}",
                request.target,
                target.texture_id()
            )));
        }

        let fallback = self.devices[open.index].sizes.first().copied();
        let size = target
            .default_buffer_size()
            .or(fallback)
            .ok_or_else(|| BackendError::ConfigureFailed("no stream size".to_string()))?;
        let pixels = source::render_source(&self.source, size)
            .map_err(|e| BackendError::ConfigureFailed(e.to_string()))?;

        // Replacing a repeating request restarts the loop
        if let Some(mut previous) = open.capture.take() {
            previous.stop();
        }

        let callbacks = open.callbacks.clone();
        let disconnect_after = self.faults.disconnect_after_frames;
        let delivered = Arc::clone(&self.frames_delivered);
        let mut sequence = 0u64;

        info!(
            ?session,
            size = %size,
            af_mode = ?request.af_mode,
            "Starting virtual repeating capture"
        );

        let controller = CaptureLoopController::start("virtual-capture", self.interval, move || {
            if disconnect_after.is_some_and(|limit| sequence >= limit) {
                warn!(frames = sequence, "Virtual camera disconnecting");
                callbacks.disconnected();
                return LoopAction::Stop;
            }
            let frame = CameraFrame::from_rgba(
                size.width(),
                size.height(),
                Arc::clone(&pixels),
                sequence,
            );
            target.queue(frame);
            delivered.fetch_add(1, Ordering::Relaxed);
            sequence += 1;
            LoopAction::Continue
        })?;
        open.capture = Some(controller);
        Ok(())
    }

    fn close(&self, device: DeviceHandle) -> BackendResult<()> {
        let removed = self.lock().open.remove(&device);
        match removed {
            Some(mut open) => {
                if let Some(mut capture) = open.capture.take() {
                    capture.stop();
                }
                info!(?device, "Virtual camera closed");
                Ok(())
            }
            None => {
                debug!(?device, "Close of a device that is not open");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VirtualDeviceSettings;
    use crate::backends::camera::LensFacing;

    fn backend() -> VirtualCameraBackend {
        VirtualCameraBackend::from_settings(&VirtualCameraSettings::default()).unwrap()
    }

    #[test]
    fn test_enumerates_configured_devices() {
        let cameras = backend().enumerate_cameras().unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].facing, LensFacing::Back);
        assert_eq!(cameras[1].facing, LensFacing::Front);
    }

    #[test]
    fn test_sizes_keep_advertised_order() {
        let backend = backend();
        let rear = backend.enumerate_cameras().unwrap().remove(0);
        let sizes = backend.output_sizes(&rear).unwrap();
        assert_eq!(sizes[0], CameraOutputSize::new(1920, 1080).unwrap());
    }

    #[test]
    fn test_unknown_device() {
        let device = CameraDevice {
            id: "nope".to_string(),
            name: "nope".to_string(),
            facing: LensFacing::Back,
        };
        assert!(matches!(
            backend().output_sizes(&device),
            Err(BackendError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_no_devices_is_unavailable() {
        let settings = VirtualCameraSettings {
            devices: Vec::<VirtualDeviceSettings>::new(),
            ..Default::default()
        };
        assert!(matches!(
            VirtualCameraBackend::from_settings(&settings),
            Err(BackendError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_close_unknown_handle_is_harmless() {
        let backend = backend();
        assert!(backend.close(DeviceHandle(42)).is_ok());
        assert!(backend.close(DeviceHandle(42)).is_ok());
        assert_eq!(backend.open_device_count(), 0);
    }
}
