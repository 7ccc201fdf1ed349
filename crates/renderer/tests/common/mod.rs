//! Recording mock backend for frame pacing tests.
//!
//! The mock keeps the state a real driver would validate: binary semaphore
//! signal state, fence state and outstanding submissions. Any misuse the
//! validation layers would flag is returned as an error so tests fail loudly.
//! Submitted work completes when its fence is waited on or the device is
//! drained, which makes the number of unretired submissions observable.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use vkspin_renderer::backend::{FrameDevice, FrameResources, PresentTarget};
use vkspin_renderer::scheduler::{FrameOutcome, FrameScheduler};
use vkspin_rhi::swapchain::{AcquireOutcome, PresentOutcome};
use vkspin_rhi::{RhiError, RhiResult, vk};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
}

// ============================================================================
// Handles and call log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemaphoreId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceId(pub usize);

/// Command buffers are identified by the resource generation that recorded
/// them and the image they draw into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBufferId {
    pub generation: u64,
    pub image: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceState {
    Signaled,
    Reset,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    WaitFence(FenceId),
    ResetFence(FenceId),
    Acquire(SemaphoreId),
    UpdateFrame(u32),
    Submit {
        command_buffer: CommandBufferId,
        wait: SemaphoreId,
        signal: SemaphoreId,
        fence: FenceId,
    },
    Present {
        image_index: u32,
        wait: SemaphoreId,
    },
    WaitIdle,
    Teardown,
    Recreate {
        width: u32,
        height: u32,
    },
    RebuildAll {
        width: u32,
        height: u32,
        image_count: usize,
    },
}

impl Call {
    pub fn is_submit(&self) -> bool {
        matches!(self, Call::Submit { .. })
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Call::Present { .. })
    }
}

/// Shared driver state.
#[derive(Debug, Default)]
pub struct GpuState {
    pub calls: Vec<Call>,
    pub semaphores: Vec<bool>,
    pub fences: Vec<FenceState>,
    pub max_pending: usize,
    /// When set, waits on pending fences never complete.
    pub hung: bool,
}

impl GpuState {
    pub fn pending(&self) -> usize {
        self.fences
            .iter()
            .filter(|state| **state == FenceState::Pending)
            .count()
    }

    fn signal(&mut self, semaphore: SemaphoreId) -> RhiResult<()> {
        let state = self
            .semaphores
            .get_mut(semaphore.0)
            .ok_or_else(|| RhiError::InvalidHandle(format!("{:?}", semaphore)))?;
        if *state {
            return Err(RhiError::InvalidHandle(format!(
                "{:?} signaled while already signaled",
                semaphore
            )));
        }
        *state = true;
        Ok(())
    }

    fn consume(&mut self, semaphore: SemaphoreId) -> RhiResult<()> {
        let state = self
            .semaphores
            .get_mut(semaphore.0)
            .ok_or_else(|| RhiError::InvalidHandle(format!("{:?}", semaphore)))?;
        if !*state {
            return Err(RhiError::InvalidHandle(format!(
                "{:?} waited on with no pending signal",
                semaphore
            )));
        }
        *state = false;
        Ok(())
    }

    fn fence_mut(&mut self, fence: FenceId) -> RhiResult<&mut FenceState> {
        self.fences
            .get_mut(fence.0)
            .ok_or_else(|| RhiError::InvalidHandle(format!("{:?}", fence)))
    }
}

pub type Gpu = Rc<RefCell<GpuState>>;

// ============================================================================
// Device
// ============================================================================

pub struct MockDevice {
    pub gpu: Gpu,
}

impl FrameDevice for MockDevice {
    type Semaphore = SemaphoreId;
    type Fence = FenceId;
    type CommandBuffer = CommandBufferId;

    fn create_semaphore(&self) -> RhiResult<SemaphoreId> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.semaphores.push(false);
        Ok(SemaphoreId(gpu.semaphores.len() - 1))
    }

    fn create_fence(&self, signaled: bool) -> RhiResult<FenceId> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.fences.push(if signaled {
            FenceState::Signaled
        } else {
            FenceState::Reset
        });
        Ok(FenceId(gpu.fences.len() - 1))
    }

    fn wait_for_fence(&self, fence: &FenceId, timeout: Option<Duration>) -> RhiResult<()> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.calls.push(Call::WaitFence(*fence));
        let hung = gpu.hung;
        let state = gpu.fence_mut(*fence)?;
        match *state {
            FenceState::Signaled => Ok(()),
            FenceState::Pending if !hung => {
                *state = FenceState::Signaled;
                Ok(())
            }
            // Nothing will ever signal a reset fence.
            FenceState::Pending | FenceState::Reset => {
                Err(RhiError::Timeout(timeout.unwrap_or(Duration::MAX), "fence"))
            }
        }
    }

    fn reset_fence(&self, fence: &FenceId) -> RhiResult<()> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.calls.push(Call::ResetFence(*fence));
        let state = gpu.fence_mut(*fence)?;
        if *state == FenceState::Pending {
            return Err(RhiError::InvalidHandle(format!(
                "{:?} reset while in use",
                fence
            )));
        }
        *state = FenceState::Reset;
        Ok(())
    }

    fn submit(
        &self,
        command_buffer: CommandBufferId,
        wait: &SemaphoreId,
        signal: &SemaphoreId,
        fence: &FenceId,
    ) -> RhiResult<()> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.calls.push(Call::Submit {
            command_buffer,
            wait: *wait,
            signal: *signal,
            fence: *fence,
        });

        let state = gpu.fence_mut(*fence)?;
        if *state != FenceState::Reset {
            return Err(RhiError::InvalidHandle(format!(
                "{:?} submitted while {:?}",
                fence, state
            )));
        }
        *state = FenceState::Pending;

        gpu.consume(*wait)?;
        gpu.signal(*signal)?;

        let pending = gpu.pending();
        gpu.max_pending = gpu.max_pending.max(pending);
        Ok(())
    }

    fn wait_idle(&self) -> RhiResult<()> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.calls.push(Call::WaitIdle);
        for state in gpu.fences.iter_mut() {
            if *state == FenceState::Pending {
                *state = FenceState::Signaled;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Swapchain
// ============================================================================

pub const FORMAT: vk::Format = vk::Format::B8G8R8A8_SRGB;

pub struct MockSwapchain {
    pub gpu: Gpu,
    pub extent: vk::Extent2D,
    /// Outcomes returned by the next acquisitions, in order. When empty,
    /// images are handed out round-robin.
    pub acquire_script: VecDeque<AcquireOutcome>,
    /// Outcomes returned by the next presents. When empty, `Optimal`.
    pub present_script: VecDeque<PresentOutcome>,
    /// Image count of the next recreated swapchain.
    pub next_image_count: Option<usize>,
    pub generation: u64,
    views: Vec<vk::ImageView>,
    next_image: usize,
}

impl MockSwapchain {
    pub fn new(gpu: Gpu, image_count: usize, extent: vk::Extent2D) -> Self {
        Self {
            gpu,
            extent,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            next_image_count: None,
            generation: 0,
            views: vec![vk::ImageView::null(); image_count],
            next_image: 0,
        }
    }
}

impl PresentTarget<MockDevice> for MockSwapchain {
    fn acquire_next_image(
        &mut self,
        _timeout: Option<Duration>,
        signal: &SemaphoreId,
    ) -> RhiResult<AcquireOutcome> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.calls.push(Call::Acquire(*signal));

        let outcome = match self.acquire_script.pop_front() {
            Some(outcome) => outcome,
            None => {
                let index = self.next_image as u32;
                self.next_image = (self.next_image + 1) % self.views.len();
                AcquireOutcome::Acquired {
                    index,
                    suboptimal: false,
                }
            }
        };

        if let AcquireOutcome::Acquired { .. } = outcome {
            gpu.signal(*signal)?;
        }
        Ok(outcome)
    }

    fn present(&mut self, image_index: u32, wait: &SemaphoreId) -> RhiResult<PresentOutcome> {
        let mut gpu = self.gpu.borrow_mut();
        gpu.calls.push(Call::Present {
            image_index,
            wait: *wait,
        });
        gpu.consume(*wait)?;
        Ok(self
            .present_script
            .pop_front()
            .unwrap_or(PresentOutcome::Optimal))
    }

    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn format(&self) -> vk::Format {
        FORMAT
    }

    fn image_views(&self) -> &[vk::ImageView] {
        &self.views
    }

    fn recreate(&mut self, extent: vk::Extent2D) -> RhiResult<()> {
        self.gpu.borrow_mut().calls.push(Call::Recreate {
            width: extent.width,
            height: extent.height,
        });
        if self.gpu.borrow().pending() != 0 {
            return Err(RhiError::SwapchainError(
                "recreated while work is pending".to_string(),
            ));
        }
        self.extent = extent;
        if let Some(count) = self.next_image_count.take() {
            self.views = vec![vk::ImageView::null(); count];
        }
        self.next_image = 0;
        self.generation += 1;
        Ok(())
    }
}

// ============================================================================
// Swapchain-dependent resources
// ============================================================================

pub struct MockResources {
    pub gpu: Gpu,
    pub generation: u64,
    pub image_count: usize,
    pub extent: vk::Extent2D,
    pub live: bool,
}

impl MockResources {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            generation: 0,
            image_count: 0,
            extent: extent(0, 0),
            live: false,
        }
    }

    fn check_image(&self, image_index: u32) -> RhiResult<()> {
        if !self.live || image_index as usize >= self.image_count {
            return Err(RhiError::InvalidHandle(format!(
                "no resources for image {} (live: {}, images: {})",
                image_index, self.live, self.image_count
            )));
        }
        Ok(())
    }
}

impl FrameResources<MockDevice> for MockResources {
    fn teardown(&mut self) {
        self.gpu.borrow_mut().calls.push(Call::Teardown);
        self.live = false;
    }

    fn rebuild_all(
        &mut self,
        extent: vk::Extent2D,
        format: vk::Format,
        image_views: &[vk::ImageView],
    ) -> RhiResult<()> {
        if format != FORMAT {
            return Err(RhiError::InvalidHandle(format!("{:?}", format)));
        }
        let image_count = image_views.len();
        self.gpu.borrow_mut().calls.push(Call::RebuildAll {
            width: extent.width,
            height: extent.height,
            image_count,
        });
        self.generation += 1;
        self.image_count = image_count;
        self.extent = extent;
        self.live = true;
        Ok(())
    }

    fn update_frame(&mut self, image_index: u32) -> RhiResult<()> {
        self.gpu.borrow_mut().calls.push(Call::UpdateFrame(image_index));
        self.check_image(image_index)
    }

    fn command_buffer(&self, image_index: u32) -> RhiResult<CommandBufferId> {
        self.check_image(image_index)?;
        Ok(CommandBufferId {
            generation: self.generation,
            image: image_index,
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A scheduler wired to a mock device, swapchain and resources.
pub struct Harness {
    pub gpu: Gpu,
    pub device: MockDevice,
    pub swapchain: MockSwapchain,
    pub resources: MockResources,
    pub scheduler: FrameScheduler<MockDevice>,
    pub framebuffer: vk::Extent2D,
}

impl Harness {
    pub fn new(frames_in_flight: usize, image_count: usize) -> Self {
        Self::with_timeout(frames_in_flight, image_count, None)
    }

    pub fn with_timeout(
        frames_in_flight: usize,
        image_count: usize,
        timeout: Option<Duration>,
    ) -> Self {
        let gpu: Gpu = Rc::new(RefCell::new(GpuState::default()));
        let framebuffer = extent(WIDTH, HEIGHT);
        let device = MockDevice { gpu: gpu.clone() };
        let swapchain = MockSwapchain::new(gpu.clone(), image_count, framebuffer);
        let mut resources = MockResources::new(gpu.clone());
        resources
            .rebuild_all(framebuffer, FORMAT, swapchain.image_views())
            .expect("initial resources");
        let scheduler = FrameScheduler::new(&device, frames_in_flight, image_count, timeout)
            .expect("scheduler");
        gpu.borrow_mut().calls.clear();

        Self {
            gpu,
            device,
            swapchain,
            resources,
            scheduler,
            framebuffer,
        }
    }

    pub fn frame(&mut self) -> RhiResult<FrameOutcome> {
        self.scheduler.render_frame(
            &self.device,
            &mut self.swapchain,
            &mut self.resources,
            self.framebuffer,
        )
    }

    pub fn rebuild(&mut self) -> RhiResult<()> {
        self.scheduler.rebuild(
            &self.device,
            &mut self.swapchain,
            &mut self.resources,
            self.framebuffer,
        )
    }

    /// Takes the calls recorded since the last drain.
    pub fn drain_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.gpu.borrow_mut().calls)
    }

    pub fn fence(&self, slot: usize) -> FenceId {
        *self.scheduler.slots().get(slot).expect("slot").in_flight()
    }

    pub fn image_available(&self, slot: usize) -> SemaphoreId {
        *self.scheduler.slots().get(slot).expect("slot").image_available()
    }

    pub fn render_finished(&self, slot: usize) -> SemaphoreId {
        *self.scheduler.slots().get(slot).expect("slot").render_finished()
    }

    /// Every handle owned by the frame slot ring, in slot order.
    pub fn slot_handles(&self) -> Vec<(SemaphoreId, SemaphoreId, FenceId)> {
        (0..self.scheduler.frames_in_flight())
            .map(|slot| {
                (
                    self.image_available(slot),
                    self.render_finished(slot),
                    self.fence(slot),
                )
            })
            .collect()
    }
}

/// Slot carried by a presented frame.
pub fn presented_slot(outcome: &FrameOutcome) -> Option<usize> {
    match outcome {
        FrameOutcome::Presented { slot, .. } => Some(*slot),
        _ => None,
    }
}
