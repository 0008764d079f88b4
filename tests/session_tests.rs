// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera session lifecycle

mod common;

use camera_preview::backends::camera::virtual_camera::{
    OpenFault, VirtualCameraBackend, VirtualFaults,
};
use camera_preview::backends::camera::{
    CameraSession, DeviceHandle, LensFacing, SessionError, SessionFailure, SessionHandle,
    SessionMonitor, SessionState,
};
use camera_preview::config::{VirtualCameraSettings, VirtualDeviceSettings};
use camera_preview::geometry::CameraOutputSize;
use camera_preview::gpu::TextureId;
use camera_preview::gpu::external_texture::image_stream;
use common::ScriptedBackend;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SETTLE: Duration = Duration::from_secs(5);

fn settings() -> VirtualCameraSettings {
    VirtualCameraSettings {
        frame_interval_ms: 5,
        ..Default::default()
    }
}

fn virtual_backend(faults: VirtualFaults) -> Arc<VirtualCameraBackend> {
    Arc::new(
        VirtualCameraBackend::from_settings(&settings())
            .unwrap()
            .with_faults(faults),
    )
}

fn wait_for(monitor: &SessionMonitor, state: SessionState) -> bool {
    let deadline = Instant::now() + SETTLE;
    while Instant::now() < deadline {
        if monitor.state() == state {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_virtual_camera_reaches_streaming() {
    let backend = virtual_backend(VirtualFaults::default());
    let (producer, mut consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);
    let monitor = session.monitor();

    session.open().unwrap();
    assert_eq!(monitor.wait_until_settled(SETTLE), SessionState::Streaming);
    assert!(monitor.is_ready());

    // First advertised size of the rear device
    let expected = CameraOutputSize::new(1920, 1080).unwrap();
    assert_eq!(monitor.output_size(), Some(expected));
    assert_eq!(consumer.default_buffer_size(), Some(expected));
    assert_eq!(session.device().map(|d| d.facing), Some(LensFacing::Back));

    let deadline = Instant::now() + SETTLE;
    let frame = loop {
        if let Some(frame) = consumer.update_tex_image() {
            break frame;
        }
        assert!(Instant::now() < deadline, "no frame arrived");
        thread::sleep(Duration::from_millis(2));
    };
    assert_eq!(frame.size(), Some(expected));
    assert!(frame.is_complete());

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(monitor.failure(), None);
    assert_eq!(monitor.output_size(), None);
    assert_eq!(session.current_output_size(), None);
    assert_eq!(backend.open_device_count(), 0);
}

#[test]
fn test_no_rear_camera_fails_synchronously() {
    let settings = VirtualCameraSettings {
        devices: vec![VirtualDeviceSettings {
            name: "Front only".to_string(),
            facing: LensFacing::Front,
            sizes: vec![CameraOutputSize::new(640, 480).unwrap()],
        }],
        ..settings()
    };
    let backend = Arc::new(VirtualCameraBackend::from_settings(&settings).unwrap());
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend, producer);

    assert!(matches!(
        session.open(),
        Err(SessionError::DeviceUnavailable(_))
    ));
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(
        session.monitor().failure(),
        Some(SessionFailure::DeviceUnavailable)
    );
}

#[test]
fn test_access_denied_is_reported_from_open() {
    let backend = virtual_backend(VirtualFaults {
        open: Some(OpenFault::Denied),
        ..Default::default()
    });
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend, producer);
    let monitor = session.monitor();

    assert!(matches!(
        session.open(),
        Err(SessionError::DeviceUnavailable(_))
    ));
    assert!(wait_for(&monitor, SessionState::Closed));
    assert_eq!(monitor.failure(), Some(SessionFailure::DeviceUnavailable));
}

#[test]
fn test_busy_device_closes_session() {
    let backend = virtual_backend(VirtualFaults {
        open: Some(OpenFault::Busy),
        ..Default::default()
    });
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);
    let monitor = session.monitor();

    session.open().unwrap();
    assert_eq!(monitor.wait_until_settled(SETTLE), SessionState::Closed);
    assert_eq!(monitor.failure(), Some(SessionFailure::DeviceUnavailable));
    assert!(!monitor.is_ready());
    assert_eq!(backend.open_device_count(), 0);
}

#[test]
fn test_configure_failure_releases_device() {
    let backend = virtual_backend(VirtualFaults {
        fail_configure: true,
        ..Default::default()
    });
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);
    let monitor = session.monitor();

    session.open().unwrap();
    assert_eq!(monitor.wait_until_settled(SETTLE), SessionState::Closed);
    assert_eq!(monitor.failure(), Some(SessionFailure::ConfigurationFailed));
    assert_eq!(backend.open_device_count(), 0);
}

#[test]
fn test_disconnect_while_streaming() {
    let backend = virtual_backend(VirtualFaults {
        disconnect_after_frames: Some(3),
        ..Default::default()
    });
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);
    let monitor = session.monitor();

    session.open().unwrap();
    assert!(wait_for(&monitor, SessionState::Closed));
    assert_eq!(monitor.failure(), Some(SessionFailure::DeviceUnavailable));
    assert!(!monitor.is_ready());
    assert_eq!(backend.open_device_count(), 0);
    assert!(backend.frames_delivered() >= 3);
    assert_eq!(monitor.output_size(), None);
}

#[test]
fn test_output_size_is_dropped_when_session_closes() {
    let backend = virtual_backend(VirtualFaults {
        disconnect_after_frames: Some(2),
        ..Default::default()
    });
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend, producer);
    let monitor = session.monitor();

    session.open().unwrap();
    assert!(wait_for(&monitor, SessionState::Closed));
    assert_eq!(monitor.output_size(), None);

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.current_output_size(), None);
    assert_eq!(monitor.output_size(), None);
}

#[test]
fn test_second_session_on_open_device_is_busy() {
    let backend = virtual_backend(VirtualFaults::default());

    let (producer, _consumer) = image_stream(TextureId(1));
    let mut first = CameraSession::new(backend.clone(), producer);
    first.open().unwrap();
    assert_eq!(first.monitor().wait_until_settled(SETTLE), SessionState::Streaming);

    let (producer, _consumer2) = image_stream(TextureId(2));
    let mut second = CameraSession::new(backend.clone(), producer);
    let monitor = second.monitor();
    second.open().unwrap();
    assert_eq!(monitor.wait_until_settled(SETTLE), SessionState::Closed);
    assert_eq!(monitor.failure(), Some(SessionFailure::DeviceUnavailable));

    // The first session keeps its device
    assert!(first.is_streaming());
    assert_eq!(backend.open_device_count(), 1);
}

#[test]
fn test_close_twice_is_a_noop() {
    let backend = virtual_backend(VirtualFaults::default());
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);

    session.open().unwrap();
    session.monitor().wait_until_settled(SETTLE);
    session.close();
    session.close();

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(backend.open_device_count(), 0);
    assert!(matches!(session.open(), Err(SessionError::AlreadyOpened)));
}

#[test]
fn test_close_before_open() {
    let backend = virtual_backend(VirtualFaults::default());
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend, producer);

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.monitor().failure(), None);
}

#[test]
fn test_close_during_pending_open_releases_late_device_once() {
    let backend = Arc::new(ScriptedBackend::new(1280, 720));
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);
    let monitor = session.monitor();

    session.open().unwrap();
    assert_eq!(monitor.state(), SessionState::Opening);

    let closer = thread::spawn(move || {
        session.close();
        session
    });

    // Let the teardown reach the worker, then answer the open
    thread::sleep(Duration::from_millis(50));
    let callbacks = backend.take_callbacks().expect("open was issued");
    callbacks.opened(DeviceHandle(7));
    drop(callbacks);

    let session = closer.join().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(backend.closes(), 1);
    assert!(!monitor.is_ready());
}

#[test]
fn test_abandoned_open_still_closes_session() {
    let backend = Arc::new(ScriptedBackend::new(1280, 720));
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);

    session.open().unwrap();
    let closer = thread::spawn(move || {
        session.close();
        session
    });

    // The backend gives up without ever answering
    thread::sleep(Duration::from_millis(20));
    drop(backend.take_callbacks());

    let session = closer.join().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(backend.closes(), 0);
}

#[test]
fn test_scripted_happy_path_publishes_states_in_order() {
    let backend = Arc::new(ScriptedBackend::new(1280, 720));
    let (producer, _consumer) = image_stream(TextureId(1));
    let mut session = CameraSession::new(backend.clone(), producer);
    let monitor = session.monitor();

    session.open().unwrap();
    let callbacks = backend.take_callbacks().unwrap();

    callbacks.opened(DeviceHandle(1));
    assert!(wait_for(&monitor, SessionState::CaptureConfiguring));
    assert_eq!(
        monitor.output_size(),
        Some(CameraOutputSize::new(1280, 720).unwrap())
    );
    assert!(!monitor.is_ready());

    callbacks.configured(SessionHandle(2));
    assert!(wait_for(&monitor, SessionState::Streaming));
    assert!(monitor.is_ready());

    drop(callbacks);
    session.close();
    assert_eq!(backend.closes(), 1);
    assert_eq!(monitor.output_size(), None);
}
