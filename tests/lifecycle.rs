//! Mount / tick / unmount behaviour against a recording backend.

mod common;

use common::{small_config, RecordingBackend};
use cosmic_backdrop::{Backdrop, BackdropError, FieldKind, FrameScheduler, ManualScheduler, TickOutcome};

#[test]
fn test_mount_then_unmount_releases_everything_once() {
    let (backend, log) = RecordingBackend::new();
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(1), 800, 600).unwrap();

    {
        let log = log.borrow();
        // stars + two nebula layers + particles
        assert_eq!(log.created.len(), 4);
        assert_eq!(log.created[0].1, FieldKind::Stars);
        assert_eq!(log.created[1].1, FieldKind::Nebula { layer: 0 });
        assert_eq!(log.created[2].1, FieldKind::Nebula { layer: 1 });
        assert_eq!(log.created[3], (log.created[3].0, FieldKind::Particles, 12));
    }

    backdrop.unmount();

    let log = log.borrow();
    assert!(log.live_fields().is_empty());
    assert_eq!(log.released_fields.len(), 4);
    assert_eq!(log.release_calls, 1);
    assert_eq!(log.renders, 0);
}

#[test]
fn test_unmount_is_idempotent() {
    let (backend, log) = RecordingBackend::new();
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(2), 800, 600).unwrap();

    backdrop.unmount();
    backdrop.unmount();
    assert!(!backdrop.is_mounted());
    drop(backdrop);

    let log = log.borrow();
    assert_eq!(log.released_fields.len(), 4);
    assert_eq!(log.release_calls, 1);
}

#[test]
fn test_drop_unmounts() {
    let (backend, log) = RecordingBackend::new();
    let backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(3), 800, 600).unwrap();
    drop(backdrop);

    let log = log.borrow();
    assert!(log.live_fields().is_empty());
    assert_eq!(log.release_calls, 1);
}

#[test]
fn test_failed_mount_releases_partial_resources() {
    let (backend, log) = RecordingBackend::failing_after(2);
    let result = Backdrop::mount(backend, ManualScheduler::new(), small_config(4), 800, 600);
    assert!(matches!(result, Err(BackdropError::Gpu(_))));

    let log = log.borrow();
    assert_eq!(log.created.len(), 2);
    assert!(log.live_fields().is_empty());
    assert_eq!(log.release_calls, 1);
}

#[test]
fn test_invalid_config_releases_backend_without_creating_fields() {
    let (backend, log) = RecordingBackend::new();
    let config = small_config(5).with_particle_count(0);
    let result = Backdrop::mount(backend, ManualScheduler::new(), config, 800, 600);
    assert!(matches!(result, Err(BackdropError::Config(_))));

    let log = log.borrow();
    assert!(log.created.is_empty());
    assert!(log.released_fields.is_empty());
    assert_eq!(log.release_calls, 1);
}

#[test]
fn test_collapsing_camera_orbit_rejected_at_mount() {
    let (backend, log) = RecordingBackend::new();
    let camera = cosmic_backdrop::CameraConfig {
        base_radius: 30.0,
        shrink: 30.0,
        ..Default::default()
    };
    let result = Backdrop::mount(backend, ManualScheduler::new(), small_config(12).with_camera(camera), 800, 600);
    assert!(matches!(result, Err(BackdropError::Config(_))));
    assert_eq!(log.borrow().release_calls, 1);
}

#[test]
fn test_mount_schedules_first_frame() {
    let (backend, _log) = RecordingBackend::new();
    let backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(6), 800, 600).unwrap();
    assert!(backdrop.scheduler().is_pending());
    assert_eq!(backdrop.scheduler().requests(), 1);
}

#[test]
fn test_tick_renders_and_reschedules() {
    let (backend, log) = RecordingBackend::new();
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(7), 800, 600).unwrap();

    for _ in 0..3 {
        assert!(backdrop.scheduler_mut().take());
        assert_eq!(backdrop.tick(), TickOutcome::Rendered);
    }
    assert!(backdrop.scheduler().is_pending());
    assert_eq!(log.borrow().renders, 3);

    let camera = log.borrow().last_camera.unwrap();
    assert_eq!(camera.viewport, [800.0, 600.0]);
}

#[test]
fn test_render_failure_skips_but_keeps_running() {
    let (mut backend, log) = RecordingBackend::new();
    backend.fail_render = true;
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(8), 800, 600).unwrap();

    backdrop.scheduler_mut().take();
    assert_eq!(backdrop.tick(), TickOutcome::Skipped);
    assert!(backdrop.scheduler().is_pending());
    assert_eq!(log.borrow().renders, 0);
}

#[test]
fn test_after_unmount_nothing_runs() {
    let (backend, log) = RecordingBackend::new();
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(9), 800, 600).unwrap();
    let trigger = backdrop.trigger();

    backdrop.unmount();

    assert!(backdrop.scheduler().is_cancelled());
    assert!(!backdrop.scheduler().is_pending());
    assert_eq!(backdrop.tick(), TickOutcome::Unmounted);
    assert!(!backdrop.scheduler().is_pending());
    assert!(!backdrop.request_next_pattern());
    // The listener is gone, so the channel reports a closed receiver.
    assert!(!trigger.fire());
    assert_eq!(log.borrow().renders, 0);
}

#[test]
fn test_resize_follows_container_and_ignores_zero() {
    let (backend, log) = RecordingBackend::new();
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(10), 800, 600).unwrap();

    backdrop.resize(1024, 768);
    backdrop.resize(0, 768);
    backdrop.resize(1024, 0);
    assert_eq!(backdrop.size(), (1024, 768));
    assert_eq!(log.borrow().resizes, vec![(1024, 768)]);

    backdrop.scheduler_mut().take();
    backdrop.tick();
    assert_eq!(log.borrow().last_camera.unwrap().viewport, [1024.0, 768.0]);
}

#[test]
fn test_nebula_rotates_every_tick() {
    let (backend, _log) = RecordingBackend::new();
    let mut backdrop = Backdrop::mount(backend, ManualScheduler::new(), small_config(11), 800, 600).unwrap();

    for _ in 0..10 {
        backdrop.tick();
    }
    let rotation = backdrop.nebula()[0].rotation();
    assert!((rotation.x - 10.0 * 0.000_05).abs() < 1e-7);
    assert!((rotation.y - 10.0 * 0.000_1).abs() < 1e-7);
    assert_eq!(backdrop.nebula()[1].rotation(), cosmic_backdrop::Vec3::ZERO);
}
