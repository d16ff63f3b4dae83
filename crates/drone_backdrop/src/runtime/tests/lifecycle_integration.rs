//! Mount, resize and unmount behaviour of [`Backdrop`]

use std::time::Duration;

use crate::core::config::{BackdropConfig, FrameErrorPolicy};
use crate::render::{ContainerHandle, RecordingBackend, RenderBackend, RenderError, Viewport};
use crate::runtime::{Backdrop, BackdropError, MountOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CONTAINER: ContainerHandle = ContainerHandle(42);

    fn config() -> BackdropConfig {
        let mut config = BackdropConfig::default();
        config.particles.count = 128;
        config.particles.seed = Some(5);
        config
    }

    fn mounted_backdrop(config: BackdropConfig) -> Backdrop<RecordingBackend> {
        let mut backdrop = Backdrop::new(config, RecordingBackend::new()).unwrap();
        let outcome = backdrop.mount(CONTAINER, Viewport::new(1280, 720), Duration::ZERO).unwrap();
        assert_eq!(outcome, MountOutcome::Mounted);
        backdrop
    }

    /// Pump every 16ms from `from` (exclusive) to `to` (inclusive)
    fn run(backdrop: &mut Backdrop<RecordingBackend>, from_ms: u64, to_ms: u64) {
        let mut now = from_ms + 16;
        while now <= to_ms {
            backdrop.pump(Duration::from_millis(now)).unwrap();
            now += 16;
        }
    }

    #[test]
    fn test_double_mount_builds_one_scene() {
        let mut backdrop = mounted_backdrop(config());
        let second = backdrop.mount(ContainerHandle(7), Viewport::new(640, 480), Duration::from_millis(16)).unwrap();

        assert_eq!(second, MountOutcome::AlreadyMounted);
        assert_eq!(backdrop.stats().mounts, 1);
        assert_eq!(backdrop.backend().calls().surfaces_created, 1);
        assert_eq!(backdrop.backend().container(), Some(CONTAINER));
        assert_eq!(backdrop.scheduler().interval_count(), 1);
        assert_eq!(backdrop.mounted().unwrap().viewport(), Viewport::new(1280, 720));
    }

    #[test]
    fn test_frames_and_blinks_run_while_mounted() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 1_008);

        let stats = backdrop.stats();
        assert_eq!(stats.frames_rendered, 63);
        assert_eq!(stats.blink_ticks, 2);
        assert_eq!(backdrop.backend().calls().draws, 63);
        // Meshes go up once at mount
        assert_eq!(backdrop.backend().calls().mesh_uploads, 1);

        let scene = backdrop.mounted().unwrap().scene();
        assert!(scene.blink.state().front_on());
        assert!(scene.graph.node(scene.drone.front_light).unwrap().visible);
        assert!(!scene.graph.node(scene.drone.back_light).unwrap().visible);
    }

    #[test]
    fn test_blink_after_one_period_switches_beacons() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 400);

        let scene = backdrop.mounted().unwrap().scene();
        assert!(scene.blink.state().back_on());
        assert!(!scene.graph.node(scene.drone.front_light).unwrap().visible);
        assert!(scene.graph.node(scene.drone.back_light).unwrap().visible);
        assert_eq!(backdrop.stats().blink_ticks, 1);
    }

    #[test]
    fn test_no_callbacks_after_unmount() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 2_000);
        let before = backdrop.stats();
        let draws = backdrop.backend().calls().draws;

        assert!(backdrop.unmount());
        assert!(!backdrop.unmount());
        run(&mut backdrop, 2_000, 6_000);

        assert_eq!(backdrop.stats().frames_rendered, before.frames_rendered);
        assert_eq!(backdrop.stats().blink_ticks, before.blink_ticks);
        assert_eq!(backdrop.backend().calls().draws, draws);
        assert_eq!(backdrop.backend().calls().releases, 1);
        assert!(!backdrop.scheduler().has_pending_frame());
        assert_eq!(backdrop.scheduler().interval_count(), 0);
        assert_eq!(backdrop.backend().surface_extent(), None);
    }

    #[test]
    fn test_remount_after_unmount_starts_fresh() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 160);
        backdrop.unmount();

        let outcome = backdrop.mount(CONTAINER, Viewport::new(800, 600), Duration::from_millis(160)).unwrap();
        assert_eq!(outcome, MountOutcome::Mounted);
        assert_eq!(backdrop.stats().mounts, 2);
        assert_eq!(backdrop.backend().calls().surfaces_created, 2);

        let scene = backdrop.mounted().unwrap().scene();
        assert_eq!(scene.motion.elapsed(), 0.0);
        assert_eq!(scene.blink.ticks(), 0);

        let frames = backdrop.stats().frames_rendered;
        run(&mut backdrop, 160, 320);
        assert_eq!(backdrop.stats().frames_rendered, frames + 10);
    }

    #[test]
    fn test_remount_after_gap_restarts_blink_period() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 16);
        backdrop.unmount();

        backdrop.mount(CONTAINER, Viewport::new(1280, 720), Duration::from_millis(10_000)).unwrap();
        let report = backdrop.pump(Duration::from_millis(10_016)).unwrap();
        assert_eq!(report.blink_ticks, 0);
        assert_eq!(report.frames, 1);
        assert!(backdrop.mounted().unwrap().scene().blink.state().front_on());

        run(&mut backdrop, 10_016, 10_384);
        assert_eq!(backdrop.stats().blink_ticks, 0);
        let report = backdrop.pump(Duration::from_millis(10_400)).unwrap();
        assert_eq!(report.blink_ticks, 1);
        assert!(backdrop.mounted().unwrap().scene().blink.state().back_on());
    }

    #[test]
    fn test_first_mount_with_late_host_clock() {
        let mut backdrop = Backdrop::new(config(), RecordingBackend::new()).unwrap();
        backdrop.mount(CONTAINER, Viewport::new(1280, 720), Duration::from_secs(90)).unwrap();
        run(&mut backdrop, 90_000, 90_384);
        assert_eq!(backdrop.stats().blink_ticks, 0);
        assert_eq!(backdrop.stats().frames_rendered, 24);

        backdrop.pump(Duration::from_millis(90_400)).unwrap();
        assert_eq!(backdrop.stats().blink_ticks, 1);
    }

    #[test]
    fn test_resize_changes_only_projection() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 320);

        let scene = backdrop.mounted().unwrap().scene();
        let positions = scene.particles.positions().to_vec();
        let pose = *scene.motion.pose();
        let propellers = scene.motion.propeller_angles();

        backdrop.resize(Viewport::new(1000, 500).with_pixel_ratio(3.0)).unwrap();

        let mounted = backdrop.mounted().unwrap();
        let scene = mounted.scene();
        assert_relative_eq!(scene.camera.aspect, 2.0);
        assert_eq!(scene.particles.positions(), positions.as_slice());
        assert_eq!(*scene.motion.pose(), pose);
        assert_eq!(scene.motion.propeller_angles(), propellers);
        assert_eq!(mounted.viewport().width, 1000);
        // Pixel ratio capped at 2
        assert_eq!(backdrop.backend().surface_extent(), Some((2000, 1000)));
        assert_eq!(backdrop.stats().resizes, 1);
    }

    #[test]
    fn test_resize_reaches_next_draw() {
        let mut backdrop = mounted_backdrop(config());
        run(&mut backdrop, 0, 16);
        let before = backdrop.backend().calls().last_projection.unwrap();

        backdrop.resize(Viewport::new(500, 1000)).unwrap();
        run(&mut backdrop, 16, 32);
        let after = backdrop.backend().calls().last_projection.unwrap();
        assert_relative_eq!(after[(1, 1)], before[(1, 1)], epsilon = 1e-6);
        assert_relative_eq!(after[(0, 0)], before[(0, 0)] * (1280.0 / 720.0) / 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_resize_while_unmounted_is_ignored() {
        let mut backdrop = Backdrop::new(config(), RecordingBackend::new()).unwrap();
        backdrop.resize(Viewport::new(10, 10)).unwrap();
        assert_eq!(backdrop.stats().resizes, 0);
        assert_eq!(backdrop.backend().calls().resizes, 0);
    }

    #[test]
    fn test_invalid_resize_is_rejected_without_side_effects() {
        let mut backdrop = mounted_backdrop(config());
        assert!(matches!(
            backdrop.resize(Viewport::new(0, 500)),
            Err(BackdropError::Render(RenderError::InvalidViewport(_)))
        ));
        assert_eq!(backdrop.mounted().unwrap().viewport(), Viewport::new(1280, 720));
    }

    #[test]
    fn test_mount_failure_leaves_backdrop_unmounted() {
        let mut backdrop = Backdrop::new(config(), RecordingBackend::without_surface_support()).unwrap();
        let result = backdrop.mount(CONTAINER, Viewport::new(1280, 720), Duration::ZERO);

        assert!(matches!(result, Err(BackdropError::Render(RenderError::InitializationFailed(_)))));
        assert!(!backdrop.is_mounted());
        assert_eq!(backdrop.stats().mounts, 0);
        assert!(!backdrop.scheduler().has_pending_frame());
        assert_eq!(backdrop.scheduler().interval_count(), 0);

        run(&mut backdrop, 0, 1_000);
        assert_eq!(backdrop.stats().frames_rendered, 0);
        assert_eq!(backdrop.stats().blink_ticks, 0);
    }

    #[test]
    fn test_mount_rejects_empty_viewport() {
        let mut backdrop = Backdrop::new(config(), RecordingBackend::new()).unwrap();
        assert!(backdrop.mount(CONTAINER, Viewport::new(1280, 0), Duration::ZERO).is_err());
        assert!(!backdrop.is_mounted());
        assert_eq!(backdrop.backend().calls().surfaces_created, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.particles.count = 0;
        assert!(matches!(
            Backdrop::new(config, RecordingBackend::new()),
            Err(BackdropError::Config(_))
        ));
    }

    #[test]
    fn test_failing_frame_is_skipped_by_default() {
        let mut backdrop = mounted_backdrop(config());
        backdrop.backend_mut().fail_next_draws(3);
        run(&mut backdrop, 0, 160);

        let stats = backdrop.stats();
        assert_eq!(stats.frames_skipped, 3);
        assert_eq!(stats.frames_rendered, 7);
        assert!(backdrop.scheduler().has_pending_frame());
    }

    #[test]
    fn test_halt_policy_surfaces_error_and_stops_frames() {
        let mut config = config();
        config.render.frame_errors = FrameErrorPolicy::Halt;
        let mut backdrop = mounted_backdrop(config);
        run(&mut backdrop, 0, 48);
        backdrop.backend_mut().fail_next_draws(1);

        let result = backdrop.pump(Duration::from_millis(64));
        assert!(matches!(result, Err(BackdropError::Render(RenderError::RenderingFailed(_)))));
        assert!(!backdrop.scheduler().has_pending_frame());

        let frames = backdrop.stats().frames_rendered;
        run(&mut backdrop, 64, 640);
        assert_eq!(backdrop.stats().frames_rendered, frames);
        // Still mounted until the host unmounts
        assert!(backdrop.is_mounted());
        assert!(backdrop.unmount());
    }
}
