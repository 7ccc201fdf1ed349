//! Swapchain rebuild against the recording mock backend.

mod common;

use common::{Call, CommandBufferId, FenceState, Harness, extent};
use vkspin_renderer::images_in_flight::ImagesInFlight;
use vkspin_renderer::lifecycle::SwapchainLifecycle;
use vkspin_renderer::scheduler::FrameOutcome;
use vkspin_rhi::RhiError;

#[test]
fn test_rebuild_order() {
    let mut h = Harness::new(2, 3);

    h.rebuild().expect("rebuild");

    assert_eq!(
        h.drain_calls(),
        vec![
            Call::WaitIdle,
            Call::Teardown,
            Call::Recreate {
                width: common::WIDTH,
                height: common::HEIGHT
            },
            Call::RebuildAll {
                width: common::WIDTH,
                height: common::HEIGHT,
                image_count: 3
            },
        ]
    );
    assert_eq!(h.scheduler.rebuilds(), 1);
    assert_eq!(h.swapchain.generation, 1);
    assert!(h.resources.live);
}

#[test]
fn test_slot_handles_survive_rebuild() {
    let mut h = Harness::new(2, 3);
    let before = h.slot_handles();
    let semaphores = h.gpu.borrow().semaphores.len();
    let fences = h.gpu.borrow().fences.len();

    h.frame().expect("frame");
    h.scheduler.request_resize();
    h.frame().expect("frame with resize");
    h.rebuild().expect("explicit rebuild");

    assert_eq!(h.scheduler.rebuilds(), 2);
    assert_eq!(h.slot_handles(), before);
    assert_eq!(h.gpu.borrow().semaphores.len(), semaphores);
    assert_eq!(h.gpu.borrow().fences.len(), fences);
}

#[test]
fn test_rebuild_drains_in_flight_work() {
    let mut h = Harness::new(2, 3);

    h.frame().expect("frame 0");
    h.frame().expect("frame 1");
    assert_eq!(h.gpu.borrow().pending(), 2);

    h.rebuild().expect("rebuild");

    assert_eq!(h.gpu.borrow().pending(), 0);
    assert!(
        h.gpu
            .borrow()
            .fences
            .iter()
            .all(|state| *state == FenceState::Signaled)
    );
}

#[test]
fn test_frame_counter_unchanged_by_rebuild() {
    let mut h = Harness::new(2, 3);

    h.frame().expect("frame");
    assert_eq!(h.scheduler.current_frame(), 1);

    h.rebuild().expect("rebuild");
    assert_eq!(h.scheduler.current_frame(), 1);

    let outcome = h.frame().expect("frame");
    assert!(matches!(outcome, FrameOutcome::Presented { slot: 1, .. }));
}

#[test]
fn test_new_image_count_resizes_table() {
    let mut h = Harness::new(2, 3);
    for _ in 0..3 {
        h.frame().expect("frame");
    }
    assert_eq!(h.scheduler.images_in_flight().marked(), 3);

    h.swapchain.next_image_count = Some(5);
    h.rebuild().expect("rebuild");

    assert_eq!(h.scheduler.images_in_flight().len(), 5);
    assert_eq!(h.scheduler.images_in_flight().marked(), 0);
    assert_eq!(h.resources.image_count, 5);

    // All five new images are reachable.
    for _ in 0..5 {
        h.frame().expect("frame");
    }
    assert_eq!(h.scheduler.images_in_flight().marked(), 5);
}

#[test]
fn test_submissions_use_rebuilt_command_buffers() {
    let mut h = Harness::new(2, 3);

    h.rebuild().expect("rebuild");
    h.drain_calls();
    h.frame().expect("frame");

    let submitted: Vec<CommandBufferId> = h
        .drain_calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Submit { command_buffer, .. } => Some(command_buffer),
            _ => None,
        })
        .collect();
    assert_eq!(
        submitted,
        vec![CommandBufferId {
            generation: 2,
            image: 0
        }]
    );
}

#[test]
fn test_zero_area_rebuild_rejected_before_teardown() {
    let mut h = Harness::new(2, 3);
    let mut lifecycle = SwapchainLifecycle::new();
    let mut images = ImagesInFlight::new(3);
    images.mark(0, 0);

    let result = lifecycle.rebuild(
        &h.device,
        &mut h.swapchain,
        &mut h.resources,
        &mut images,
        extent(0, 480),
    );

    assert!(matches!(result, Err(RhiError::SwapchainError(_))));
    assert!(h.drain_calls().is_empty());
    assert!(h.resources.live);
    assert_eq!(images.owner(0), Some(0));
    assert_eq!(lifecycle.rebuilds(), 0);
}

#[test]
fn test_rebuild_uses_new_framebuffer_size() {
    let mut h = Harness::new(2, 3);

    h.framebuffer = extent(1920, 1080);
    h.rebuild().expect("rebuild");

    assert_eq!(h.swapchain.extent, extent(1920, 1080));
    assert_eq!(h.resources.extent, extent(1920, 1080));
}
