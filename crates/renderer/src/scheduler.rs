//! Per-frame pacing.
//!
//! [`FrameScheduler::render_frame`] runs one iteration of the render loop:
//!
//! ```text
//! wait slot fence -> acquire -> wait image owner -> update uniforms
//!     -> reset slot fence -> submit -> present -> advance
//! ```
//!
//! At most N submissions are ever unfenced: a slot's fence is reset only
//! right before that slot submits again, and only after the CPU has seen
//! it signaled. A fence is therefore never left reset without a pending
//! submission, which keeps every later wait on it finite.

use std::time::Duration;

use ash::vk;
use tracing::{debug, trace};
use vkspin_rhi::swapchain::AcquireOutcome;
use vkspin_rhi::{RhiError, RhiResult};

use crate::backend::{FrameDevice, FrameResources, PresentTarget};
use crate::frame_slots::FrameSlots;
use crate::images_in_flight::ImagesInFlight;
use crate::lifecycle::SwapchainLifecycle;

/// What one call to [`FrameScheduler::render_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for presentation.
    Presented {
        /// Frame slot that carried the frame.
        slot: usize,
        /// Swapchain image that was drawn.
        image_index: u32,
        /// Whether the swapchain was rebuilt after presenting.
        rebuilt: bool,
    },
    /// Acquisition reported the swapchain out of date. It was rebuilt and
    /// nothing was submitted or presented.
    OutOfDate,
    /// The framebuffer has zero area; nothing was done.
    Skipped,
}

/// Owns the frame slot ring and the images-in-flight table, and drives the
/// swapchain lifecycle.
pub struct FrameScheduler<D: FrameDevice> {
    slots: FrameSlots<D>,
    images_in_flight: ImagesInFlight,
    lifecycle: SwapchainLifecycle,
    current_frame: usize,
    timeout: Option<Duration>,
    resize_requested: bool,
    frames_presented: u64,
}

impl<D: FrameDevice> FrameScheduler<D> {
    /// Creates `frames_in_flight` slots and an idle table of `image_count`
    /// images. `timeout` bounds every fence wait and acquisition; `None`
    /// waits forever.
    pub fn new(
        device: &D,
        frames_in_flight: usize,
        image_count: usize,
        timeout: Option<Duration>,
    ) -> RhiResult<Self> {
        let slots = FrameSlots::new(device, frames_in_flight)?;

        debug!(
            "Frame scheduler: {} frames in flight, {} swapchain images, timeout {:?}",
            frames_in_flight, image_count, timeout
        );

        Ok(Self {
            slots,
            images_in_flight: ImagesInFlight::new(image_count),
            lifecycle: SwapchainLifecycle::new(),
            current_frame: 0,
            timeout,
            resize_requested: false,
            frames_presented: 0,
        })
    }

    /// Slot index the next frame will use.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn slots(&self) -> &FrameSlots<D> {
        &self.slots
    }

    #[inline]
    pub fn images_in_flight(&self) -> &ImagesInFlight {
        &self.images_in_flight
    }

    /// Number of swapchain rebuilds so far.
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.lifecycle.rebuilds()
    }

    #[inline]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Flags the framebuffer as resized. The swapchain is rebuilt after the
    /// next successful present. The flag survives skipped frames.
    pub fn request_resize(&mut self) {
        self.resize_requested = true;
    }

    #[inline]
    pub fn resize_requested(&self) -> bool {
        self.resize_requested
    }

    /// Renders and presents one frame.
    ///
    /// `framebuffer` is the window's current size in pixels and is used for
    /// any rebuild this frame triggers.
    ///
    /// # Errors
    ///
    /// Every error is fatal: device loss, an expired bounded wait, a failed
    /// submission, an unexpected acquire or present result, or a failed
    /// rebuild.
    pub fn render_frame<T, R>(
        &mut self,
        device: &D,
        target: &mut T,
        resources: &mut R,
        framebuffer: vk::Extent2D,
    ) -> RhiResult<FrameOutcome>
    where
        T: PresentTarget<D>,
        R: FrameResources<D>,
    {
        if framebuffer.width == 0 || framebuffer.height == 0 {
            trace!("Framebuffer has zero area, skipping frame");
            return Ok(FrameOutcome::Skipped);
        }

        let slot_index = self.current_frame;
        let slot = self.slots.get(slot_index).ok_or_else(|| {
            RhiError::InvalidHandle(format!("frame slot {} out of range", slot_index))
        })?;

        device.wait_for_fence(slot.in_flight(), self.timeout)?;

        let image_index = match target.acquire_next_image(self.timeout, slot.image_available())? {
            AcquireOutcome::OutOfDate => {
                debug!("Swapchain out of date on acquire (slot {})", slot_index);
                // The slot fence stays signaled and the semaphore unsignaled,
                // so the same slot is reused for the retry.
                self.resize_requested = false;
                self.lifecycle.rebuild(
                    device,
                    target,
                    resources,
                    &mut self.images_in_flight,
                    framebuffer,
                )?;
                return Ok(FrameOutcome::OutOfDate);
            }
            AcquireOutcome::Acquired { index, suboptimal } => {
                if suboptimal {
                    trace!("Acquired suboptimal image {}", index);
                }
                index
            }
        };

        let image = image_index as usize;
        if image >= self.images_in_flight.len() {
            return Err(RhiError::SwapchainError(format!(
                "acquired image {} but the swapchain has {} images",
                image_index,
                self.images_in_flight.len()
            )));
        }

        if let Some(owner) = self.images_in_flight.owner(image)
            && owner != slot_index
        {
            let owner_slot = self.slots.get(owner).ok_or_else(|| {
                RhiError::InvalidHandle(format!("frame slot {} out of range", owner))
            })?;
            trace!(
                "Image {} still owned by slot {}, waiting on its fence",
                image_index, owner
            );
            device.wait_for_fence(owner_slot.in_flight(), self.timeout)?;
        }
        self.images_in_flight.mark(image, slot_index);

        resources.update_frame(image_index)?;
        let command_buffer = resources.command_buffer(image_index)?;

        device.reset_fence(slot.in_flight())?;
        device.submit(
            command_buffer,
            slot.image_available(),
            slot.render_finished(),
            slot.in_flight(),
        )?;

        let presented = target.present(image_index, slot.render_finished())?;

        self.current_frame = self.slots.next_index(slot_index);
        self.frames_presented += 1;

        let resize = std::mem::take(&mut self.resize_requested);
        let rebuilt = presented.is_stale() || resize;
        if rebuilt {
            debug!(
                "Rebuilding after present (result {:?}, resize requested: {})",
                presented, resize
            );
            self.lifecycle.rebuild(
                device,
                target,
                resources,
                &mut self.images_in_flight,
                framebuffer,
            )?;
        }

        trace!(
            "Frame presented: slot {}, image {}",
            slot_index, image_index
        );

        Ok(FrameOutcome::Presented {
            slot: slot_index,
            image_index,
            rebuilt,
        })
    }

    /// Rebuilds the swapchain immediately.
    pub fn rebuild<T, R>(
        &mut self,
        device: &D,
        target: &mut T,
        resources: &mut R,
        framebuffer: vk::Extent2D,
    ) -> RhiResult<()>
    where
        T: PresentTarget<D>,
        R: FrameResources<D>,
    {
        self.resize_requested = false;
        self.lifecycle.rebuild(
            device,
            target,
            resources,
            &mut self.images_in_flight,
            framebuffer,
        )
    }
}
