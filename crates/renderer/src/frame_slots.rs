//! The ring of per-frame synchronization objects.
//!
//! Each [`FrameSlot`] owns the semaphores and fence of one frame in flight.
//! The ring is created once, is sized by configuration rather than by the
//! swapchain, and survives every swapchain rebuild.
//!
//! # Synchronization Flow
//!
//! ```text
//! 1. Wait on in_flight (CPU waits for the slot's previous submission)
//! 2. Acquire an image, signaling image_available
//! 3. Reset in_flight, submit:
//!    - wait on image_available at COLOR_ATTACHMENT_OUTPUT
//!    - signal render_finished and in_flight
//! 4. Present, waiting on render_finished
//! ```

use tracing::debug;
use vkspin_rhi::{RhiError, RhiResult};

use crate::backend::FrameDevice;

/// Synchronization objects of one frame in flight.
pub struct FrameSlot<D: FrameDevice> {
    image_available: D::Semaphore,
    render_finished: D::Semaphore,
    in_flight: D::Fence,
}

impl<D: FrameDevice> FrameSlot<D> {
    /// The fence starts signaled so the first wait on a fresh slot returns
    /// immediately.
    fn new(device: &D) -> RhiResult<Self> {
        Ok(Self {
            image_available: device.create_semaphore()?,
            render_finished: device.create_semaphore()?,
            in_flight: device.create_fence(true)?,
        })
    }

    /// Signaled by acquisition, waited on by the submission.
    #[inline]
    pub fn image_available(&self) -> &D::Semaphore {
        &self.image_available
    }

    /// Signaled by the submission, waited on by presentation.
    #[inline]
    pub fn render_finished(&self) -> &D::Semaphore {
        &self.render_finished
    }

    /// Signaled when the slot's last submission has retired.
    #[inline]
    pub fn in_flight(&self) -> &D::Fence {
        &self.in_flight
    }
}

/// Fixed ring of N frame slots.
pub struct FrameSlots<D: FrameDevice> {
    slots: Vec<FrameSlot<D>>,
}

impl<D: FrameDevice> FrameSlots<D> {
    /// Creates `count` slots.
    ///
    /// # Errors
    ///
    /// Fails when `count` is zero or any object cannot be created. Objects
    /// created before the failure are dropped.
    pub fn new(device: &D, count: usize) -> RhiResult<Self> {
        if count == 0 {
            return Err(RhiError::InvalidHandle(
                "at least one frame in flight is required".to_string(),
            ));
        }

        let slots = (0..count)
            .map(|_| FrameSlot::new(device))
            .collect::<RhiResult<Vec<_>>>()?;

        debug!("Created {} frame slot(s)", count);

        Ok(Self { slots })
    }

    /// Number of slots (N).
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a ring has at least one slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at `index`, which must be below [`len`](Self::len).
    #[inline]
    pub fn get(&self, index: usize) -> Option<&FrameSlot<D>> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameSlot<D>> {
        self.slots.iter()
    }

    /// Slot index that follows `index` in the ring.
    #[inline]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }
}
