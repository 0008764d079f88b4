// SPDX-License-Identifier: GPL-3.0-only

//! Camera session manager
//!
//! Drives one rear camera from "nothing opened" to "streaming into the image
//! stream", reacting to backend callbacks:
//!
//! ```text
//! Unopened ─open()─▶ Opening ─opened─▶ Open ─▶ CaptureConfiguring ─configured─▶ Streaming
//!                       │                │              │                          │
//!                       └────────────────┴── error / disconnect / close ───────────┴──▶ Closed
//! ```
//!
//! Closed is terminal. Callbacks are handled in order on a dedicated worker
//! thread. The render context only ever reads the published state through a
//! [`SessionMonitor`]. Each published field has exactly one writer at any time:
//! the caller thread until the worker is spawned, the worker afterwards.

use super::{
    BackendError, CameraBackend, CameraDevice, CameraEvent, CaptureRequest, DeviceErrorKind,
    DeviceHandle, LensFacing, SessionHandle,
};
use crate::constants::session::{CALLBACK_THREAD_NAME, SETTLE_POLL_INTERVAL};
use crate::geometry::CameraOutputSize;
use crate::gpu::external_texture::ImageProducer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// Lifecycle state of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Unopened = 0,
    Opening = 1,
    Open = 2,
    CaptureConfiguring = 3,
    Streaming = 4,
    /// Terminal, reached on teardown or on any failure
    Closed = 5,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Unopened,
            1 => SessionState::Opening,
            2 => SessionState::Open,
            3 => SessionState::CaptureConfiguring,
            4 => SessionState::Streaming,
            _ => SessionState::Closed,
        }
    }

    /// Streaming or Closed: nothing further happens without caller action
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionState::Streaming | SessionState::Closed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unopened => "unopened",
            SessionState::Opening => "opening",
            SessionState::Open => "open",
            SessionState::CaptureConfiguring => "configuring",
            SessionState::Streaming => "streaming",
            SessionState::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// What a caller of the session sees when the camera cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No rear camera, access refused, busy, or disconnected
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// The capture session could not be configured
    #[error("capture session configuration failed: {0}")]
    ConfigurationFailed(String),
    /// `open` was called on a session that is not Unopened
    #[error("session was already opened")]
    AlreadyOpened,
}

/// Why a session ended up Closed, if it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFailure {
    DeviceUnavailable,
    ConfigurationFailed,
}

impl SessionFailure {
    fn code(self) -> u8 {
        match self {
            SessionFailure::DeviceUnavailable => 1,
            SessionFailure::ConfigurationFailed => 2,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SessionFailure::DeviceUnavailable),
            2 => Some(SessionFailure::ConfigurationFailed),
            _ => None,
        }
    }

    fn into_error(self, message: String) -> SessionError {
        match self {
            SessionFailure::DeviceUnavailable => SessionError::DeviceUnavailable(message),
            SessionFailure::ConfigurationFailed => SessionError::ConfigurationFailed(message),
        }
    }
}

/// Fields published from the session to the render context
#[derive(Debug)]
struct SessionShared {
    state: AtomicU8,
    /// Packed `CameraOutputSize`, 0 while unknown
    output_size: AtomicU64,
    failure: AtomicU8,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Unopened as u8),
            output_size: AtomicU64::new(0),
            failure: AtomicU8::new(0),
        }
    }

    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn publish_state(&self, state: SessionState) {
        let previous = SessionState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            info!(from = %previous, to = %state, "Camera session state changed");
        }
    }

    fn output_size(&self) -> Option<CameraOutputSize> {
        CameraOutputSize::unpack(self.output_size.load(Ordering::Acquire))
    }

    fn publish_output_size(&self, size: CameraOutputSize) {
        self.output_size.store(size.pack(), Ordering::Release);
    }

    fn clear_output_size(&self) {
        self.output_size.store(0, Ordering::Release);
    }

    fn failure(&self) -> Option<SessionFailure> {
        SessionFailure::from_code(self.failure.load(Ordering::Acquire))
    }

    fn publish_failure(&self, failure: SessionFailure) {
        self.failure.store(failure.code(), Ordering::Release);
    }
}

/// Read-only view of a session, safe to hand to the render context
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    shared: Arc<SessionShared>,
}

impl SessionMonitor {
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Negotiated output size; known from CaptureConfiguring until Closed
    pub fn output_size(&self) -> Option<CameraOutputSize> {
        self.shared.output_size()
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    /// Streaming with a known output size
    pub fn is_ready(&self) -> bool {
        self.is_streaming() && self.output_size().is_some()
    }

    pub fn failure(&self) -> Option<SessionFailure> {
        self.shared.failure()
    }

    /// Block until the session is Streaming or Closed, or `timeout` elapses
    ///
    /// Returns the state observed last.
    pub fn wait_until_settled(&self, timeout: Duration) -> SessionState {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.state();
            if state.is_settled() || Instant::now() >= deadline {
                return state;
            }
            thread::sleep(SETTLE_POLL_INTERVAL);
        }
    }
}

enum WorkerMessage {
    Callback(CameraEvent),
    /// `open` was refused synchronously by the backend
    OpenRejected(BackendError),
    Teardown,
}

/// Callback sink handed to a backend
///
/// Every call is queued to the session's worker. Calls made after the session
/// has finished are dropped.
#[derive(Debug, Clone)]
pub struct CameraCallbacks {
    tx: Sender<WorkerMessage>,
}

impl std::fmt::Debug for WorkerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerMessage::Callback(event) => write!(f, "Callback({event:?})"),
            WorkerMessage::OpenRejected(err) => write!(f, "OpenRejected({err})"),
            WorkerMessage::Teardown => write!(f, "Teardown"),
        }
    }
}

impl CameraCallbacks {
    fn send(&self, event: CameraEvent) {
        if self.tx.send(WorkerMessage::Callback(event)).is_err() {
            trace!(?event, "Camera callback after session finished");
        }
    }

    pub fn opened(&self, device: DeviceHandle) {
        self.send(CameraEvent::DeviceOpened(device));
    }

    pub fn disconnected(&self) {
        self.send(CameraEvent::DeviceDisconnected);
    }

    pub fn error(&self, kind: DeviceErrorKind) {
        self.send(CameraEvent::DeviceError(kind));
    }

    pub fn configured(&self, session: SessionHandle) {
        self.send(CameraEvent::SessionConfigured(session));
    }

    pub fn configure_failed(&self) {
        self.send(CameraEvent::SessionConfigureFailed);
    }
}

/// Owner of one camera session
///
/// Holds write access to the image stream through its [`ImageProducer`];
/// the presenter holds the matching consumer.
pub struct CameraSession {
    backend: Arc<dyn CameraBackend>,
    producer: ImageProducer,
    shared: Arc<SessionShared>,
    tx: Option<Sender<WorkerMessage>>,
    worker: Option<JoinHandle<()>>,
    device: Option<CameraDevice>,
}

impl CameraSession {
    pub fn new(backend: Arc<dyn CameraBackend>, producer: ImageProducer) -> Self {
        Self {
            backend,
            producer,
            shared: Arc::new(SessionShared::new()),
            tx: None,
            worker: None,
            device: None,
        }
    }

    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn current_output_size(&self) -> Option<CameraOutputSize> {
        self.shared.output_size()
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    /// Device selected by `open`, if any
    pub fn device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    /// Select the rear camera and request access to it
    ///
    /// Returns once the request is issued; progress is visible through the
    /// monitor. Failures detected before the request is issued are returned
    /// here and also leave the session Closed.
    pub fn open(&mut self) -> Result<(), SessionError> {
        if self.state() != SessionState::Unopened {
            return Err(SessionError::AlreadyOpened);
        }

        let (device, size) = match self.select_device() {
            Ok(selection) => selection,
            Err((failure, message)) => return Err(self.fail_before_worker(failure, message)),
        };

        info!(
            device = %device.name,
            id = %device.id,
            size = %size,
            "Opening rear camera"
        );
        self.shared.publish_state(SessionState::Opening);

        let (tx, rx) = mpsc::channel();
        let callbacks = CameraCallbacks { tx: tx.clone() };
        let worker = SessionWorker {
            backend: Arc::clone(&self.backend),
            producer: self.producer.clone(),
            shared: Arc::clone(&self.shared),
            size,
            callbacks: Some(callbacks.clone()),
            device: None,
            teardown_requested: false,
        };

        let handle = match thread::Builder::new()
            .name(CALLBACK_THREAD_NAME.to_string())
            .spawn(move || worker.run(rx))
        {
            Ok(handle) => handle,
            Err(e) => {
                return Err(self.fail_before_worker(
                    SessionFailure::DeviceUnavailable,
                    format!("failed to start callback worker: {e}"),
                ));
            }
        };

        self.tx = Some(tx);
        self.worker = Some(handle);
        self.device = Some(device.clone());

        if let Err(e) = self.backend.open(&device, callbacks) {
            let message = e.to_string();
            if let Some(tx) = &self.tx {
                let _ = tx.send(WorkerMessage::OpenRejected(e));
            }
            return Err(SessionError::DeviceUnavailable(message));
        }

        Ok(())
    }

    fn select_device(
        &self,
    ) -> Result<(CameraDevice, CameraOutputSize), (SessionFailure, String)> {
        let unavailable = |message: String| (SessionFailure::DeviceUnavailable, message);

        let cameras = self
            .backend
            .enumerate_cameras()
            .map_err(|e| unavailable(e.to_string()))?;
        debug!(count = cameras.len(), "Enumerated cameras");

        let device = cameras
            .into_iter()
            .find(|c| c.facing == LensFacing::Back)
            .ok_or_else(|| unavailable("no rear-facing camera".to_string()))?;

        // First advertised size; not aspect-aware
        let size = self
            .backend
            .output_sizes(&device)
            .map_err(|e| unavailable(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| unavailable(format!("{} advertises no output sizes", device.name)))?;

        Ok((device, size))
    }

    /// Fail while the caller thread is still the only writer
    fn fail_before_worker(&mut self, failure: SessionFailure, message: String) -> SessionError {
        warn!(?failure, error = %message, "Camera session failed before opening");
        self.shared.publish_failure(failure);
        self.shared.publish_state(SessionState::Closed);
        failure.into_error(message)
    }

    /// Tear the session down and release the device
    ///
    /// Safe to call any number of times; only the first call does anything.
    pub fn close(&mut self) {
        match self.tx.take() {
            Some(tx) => {
                debug!("Requesting camera session teardown");
                let _ = tx.send(WorkerMessage::Teardown);
                drop(tx);
                if let Some(handle) = self.worker.take() {
                    if handle.join().is_err() {
                        error!("Camera callback worker panicked");
                    }
                }
            }
            None => {
                if self.state() == SessionState::Unopened {
                    self.shared.publish_state(SessionState::Closed);
                }
            }
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

enum Flow {
    Continue,
    Exit,
}

/// State owned by the camera-callbacks worker
struct SessionWorker {
    backend: Arc<dyn CameraBackend>,
    producer: ImageProducer,
    shared: Arc<SessionShared>,
    size: CameraOutputSize,
    callbacks: Option<CameraCallbacks>,
    device: Option<DeviceHandle>,
    teardown_requested: bool,
}

impl SessionWorker {
    fn run(mut self, rx: Receiver<WorkerMessage>) {
        debug!("Camera callback worker started");

        while let Ok(message) = rx.recv() {
            trace!(?message, "Camera worker message");
            let flow = match message {
                WorkerMessage::Callback(event) => self.handle_event(event),
                WorkerMessage::OpenRejected(e) => {
                    self.fail(SessionFailure::DeviceUnavailable, e.to_string())
                }
                WorkerMessage::Teardown => self.teardown(),
            };
            if let Flow::Exit = flow {
                break;
            }
        }

        // Channel closed while waiting for a pending open
        self.release();
        // The negotiated size does not outlive the session
        self.shared.clear_output_size();
        self.shared.publish_state(SessionState::Closed);
        debug!("Camera callback worker exiting");
    }

    fn handle_event(&mut self, event: CameraEvent) -> Flow {
        match event {
            CameraEvent::DeviceOpened(handle) => self.on_opened(handle),
            CameraEvent::SessionConfigured(session) => self.on_configured(session),
            CameraEvent::SessionConfigureFailed => self.fail(
                SessionFailure::ConfigurationFailed,
                "capture session configuration rejected".to_string(),
            ),
            CameraEvent::DeviceDisconnected => self.fail(
                SessionFailure::DeviceUnavailable,
                "camera disconnected".to_string(),
            ),
            CameraEvent::DeviceError(kind) => {
                self.fail(SessionFailure::DeviceUnavailable, kind.to_string())
            }
        }
    }

    fn on_opened(&mut self, handle: DeviceHandle) -> Flow {
        if self.teardown_requested {
            debug!(?handle, "Device opened after teardown, closing it");
            self.device = Some(handle);
            return Flow::Exit;
        }
        if self.shared.state() != SessionState::Opening {
            warn!(?handle, "Ignoring unexpected device-opened callback");
            return Flow::Continue;
        }

        self.device = Some(handle);
        self.shared.publish_state(SessionState::Open);

        self.producer.set_default_buffer_size(self.size);
        self.shared.publish_output_size(self.size);
        info!(
            width = self.size.width(),
            height = self.size.height(),
            texture = %self.producer.texture_id(),
            "Configuring capture session"
        );
        self.shared.publish_state(SessionState::CaptureConfiguring);

        let Some(callbacks) = self.callbacks.clone() else {
            return Flow::Exit;
        };
        match self
            .backend
            .create_capture_session(handle, self.producer.clone(), callbacks)
        {
            Ok(()) => Flow::Continue,
            Err(e) => self.fail(SessionFailure::ConfigurationFailed, e.to_string()),
        }
    }

    fn on_configured(&mut self, session: SessionHandle) -> Flow {
        if self.shared.state() != SessionState::CaptureConfiguring {
            warn!(?session, "Ignoring unexpected session-configured callback");
            return Flow::Continue;
        }

        let request = CaptureRequest::preview(self.producer.texture_id());
        match self.backend.set_repeating_request(session, request) {
            Ok(()) => {
                self.shared.publish_state(SessionState::Streaming);
                Flow::Continue
            }
            Err(e) => self.fail(SessionFailure::ConfigurationFailed, e.to_string()),
        }
    }

    fn teardown(&mut self) -> Flow {
        if self.shared.state() == SessionState::Opening && self.device.is_none() {
            // Open still pending: wait for its outcome so the device is not leaked
            debug!("Teardown requested while opening, waiting for open result");
            self.teardown_requested = true;
            self.callbacks = None;
            return Flow::Continue;
        }
        Flow::Exit
    }

    fn fail(&mut self, failure: SessionFailure, message: String) -> Flow {
        if self.teardown_requested {
            debug!(error = %message, "Open failed after teardown");
        } else {
            warn!(?failure, error = %message, "Camera session failed");
            self.shared.publish_failure(failure);
        }
        Flow::Exit
    }

    /// Close the device if one is held; runs at most once per device
    fn release(&mut self) {
        if let Some(handle) = self.device.take() {
            info!(?handle, "Releasing camera device");
            if let Err(e) = self.backend.close(handle) {
                warn!(error = %e, "Failed to close camera device");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            SessionState::Unopened,
            SessionState::Opening,
            SessionState::Open,
            SessionState::CaptureConfiguring,
            SessionState::Streaming,
            SessionState::Closed,
        ] {
            assert_eq!(SessionState::from_u8(state as u8), state);
        }
    }

    #[test]
    fn test_ready_requires_size_and_streaming() {
        let shared = Arc::new(SessionShared::new());
        let monitor = SessionMonitor {
            shared: Arc::clone(&shared),
        };
        assert!(!monitor.is_ready());

        shared.publish_state(SessionState::Streaming);
        assert!(!monitor.is_ready());

        shared.publish_output_size(CameraOutputSize::new(640, 480).unwrap());
        assert!(monitor.is_ready());

        shared.publish_state(SessionState::Closed);
        assert!(!monitor.is_ready());

        shared.clear_output_size();
        assert_eq!(monitor.output_size(), None);
    }

    #[test]
    fn test_failure_codes() {
        let shared = SessionShared::new();
        assert_eq!(shared.failure(), None);
        shared.publish_failure(SessionFailure::ConfigurationFailed);
        assert_eq!(shared.failure(), Some(SessionFailure::ConfigurationFailed));
    }

    #[test]
    fn test_wait_until_settled_times_out() {
        let monitor = SessionMonitor {
            shared: Arc::new(SessionShared::new()),
        };
        let state = monitor.wait_until_settled(Duration::from_millis(10));
        assert_eq!(state, SessionState::Unopened);
    }
}
