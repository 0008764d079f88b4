// SPDX-License-Identifier: GPL-3.0-only

//! External image stream
//!
//! A camera writes images into a stream; the GPU side advances its texture to
//! the latest one. Ownership is split into two halves created together:
//!
//! ```text
//!   camera session ──ImageProducer──▶ [ latest slot ] ──ImageConsumer──▶ presenter
//!                     queue()                            update_tex_image()
//! ```
//!
//! The slot holds at most one pending image. Queueing replaces an image that was
//! never consumed; consuming never blocks and returns `None` when nothing new
//! arrived, in which case the presenter redraws what it already has.
//!
//! This stands in for a platform external texture, which carries its own
//! internal synchronisation. The slot's `Mutex` plays that role and is held only
//! to swap one `CameraFrame` handle in or out. It is the one lock in the preview
//! path; session state and render state are shared through atomics.

use super::TextureId;
use crate::backends::camera::CameraFrame;
use crate::geometry::CameraOutputSize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Default)]
struct Slot {
    latest: Option<CameraFrame>,
    default_size: Option<CameraOutputSize>,
    queued: u64,
    replaced: u64,
}

/// Create a connected producer/consumer pair for `texture`
pub fn image_stream(texture: TextureId) -> (ImageProducer, ImageConsumer) {
    let slot = Arc::new(Mutex::new(Slot::default()));
    (
        ImageProducer {
            texture,
            slot: Arc::clone(&slot),
        },
        ImageConsumer { texture, slot },
    )
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write half of the stream, owned by the camera side
#[derive(Debug, Clone)]
pub struct ImageProducer {
    texture: TextureId,
    slot: Arc<Mutex<Slot>>,
}

impl ImageProducer {
    /// Texture this stream feeds
    pub fn texture_id(&self) -> TextureId {
        self.texture
    }

    /// Size images are expected to arrive in
    pub fn set_default_buffer_size(&self, size: CameraOutputSize) {
        lock(&self.slot).default_size = Some(size);
    }

    pub fn default_buffer_size(&self) -> Option<CameraOutputSize> {
        lock(&self.slot).default_size
    }

    /// Publish a new image, replacing one that has not been consumed yet
    pub fn queue(&self, frame: CameraFrame) {
        let mut slot = lock(&self.slot);
        slot.queued += 1;
        if slot.latest.replace(frame).is_some() {
            slot.replaced += 1;
            trace!(texture = %self.texture, "Replaced unconsumed camera image");
        }
    }

    /// Number of queued images that were replaced before being consumed
    pub fn replaced_count(&self) -> u64 {
        lock(&self.slot).replaced
    }

    /// Total number of images queued
    pub fn queued_count(&self) -> u64 {
        lock(&self.slot).queued
    }
}

/// Read half of the stream, owned by the presenter
#[derive(Debug)]
pub struct ImageConsumer {
    texture: TextureId,
    slot: Arc<Mutex<Slot>>,
}

impl ImageConsumer {
    pub fn texture_id(&self) -> TextureId {
        self.texture
    }

    /// Take the latest image if one arrived since the last call
    pub fn update_tex_image(&mut self) -> Option<CameraFrame> {
        lock(&self.slot).latest.take()
    }

    pub fn default_buffer_size(&self) -> Option<CameraOutputSize> {
        lock(&self.slot).default_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sequence: u64) -> CameraFrame {
        CameraFrame::from_rgba(1, 1, Arc::from(vec![0u8; 4]), sequence)
    }

    #[test]
    fn test_latest_image_wins() {
        let (producer, mut consumer) = image_stream(TextureId(1));
        producer.queue(frame(1));
        producer.queue(frame(2));

        let taken = consumer.update_tex_image().map(|f| f.sequence);
        assert_eq!(taken, Some(2));
        assert_eq!(producer.replaced_count(), 1);
        assert_eq!(producer.queued_count(), 2);
    }

    #[test]
    fn test_no_new_image_is_none() {
        let (producer, mut consumer) = image_stream(TextureId(1));
        assert!(consumer.update_tex_image().is_none());
        producer.queue(frame(1));
        assert!(consumer.update_tex_image().is_some());
        assert!(consumer.update_tex_image().is_none());
    }

    #[test]
    fn test_default_buffer_size_is_shared() {
        let (producer, consumer) = image_stream(TextureId(4));
        assert_eq!(consumer.default_buffer_size(), None);
        let size = CameraOutputSize::new(1280, 720).unwrap();
        producer.set_default_buffer_size(size);
        assert_eq!(consumer.default_buffer_size(), Some(size));
        assert_eq!(producer.texture_id(), consumer.texture_id());
    }
}
