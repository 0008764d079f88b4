// SPDX-License-Identifier: GPL-3.0-only

//! Thread lifecycle management for repeating capture
//!
//! A backend serving a repeating capture request runs one paced loop on its
//! own named thread. The controller owns the thread: dropping or stopping it
//! signals the loop and joins, so no capture thread outlives its session.

use super::{BackendError, BackendResult};
use crate::constants::virtual_camera::STOP_CHECK_INTERVAL;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a paced capture loop running in a separate thread
///
/// ```ignore
/// let mut controller = CaptureLoopController::start("virtual-capture", interval, move || {
///     producer.queue(source.next_frame());
///     LoopAction::Continue
/// })?;
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct CaptureLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl CaptureLoopController {
    /// Start a loop that calls `loop_fn` once per `interval`
    ///
    /// The closure runs until it returns `LoopAction::Stop` or the controller
    /// is stopped. Sleeping between iterations checks the stop signal often, so
    /// `stop()` returns promptly even with long intervals.
    pub fn start<F>(name: &str, interval: Duration, mut loop_fn: F) -> BackendResult<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, interval_ms = interval.as_millis() as u64, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Capture loop thread started");

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    let started = Instant::now();
                    if loop_fn() == LoopAction::Stop {
                        debug!(name = %name_clone, "Loop requested stop");
                        break;
                    }

                    let deadline = started + interval;
                    if !sleep_until(deadline, &stop_signal_clone) {
                        debug!(name = %name_clone, "Stop signal received while waiting");
                        break;
                    }
                }

                info!(name = %name_clone, "Capture loop thread exiting");
            })
            .map_err(|e| BackendError::Other(format!("failed to spawn {name}: {e}")))?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting for it
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Stopping from inside the loop; the thread exits on its own
                return;
            }
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

/// Sleep until `deadline`, returning false if the stop signal was raised
fn sleep_until(deadline: Instant, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(STOP_CHECK_INTERVAL));
    }
}
