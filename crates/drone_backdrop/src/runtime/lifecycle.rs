//! # Backdrop Lifecycle
//!
//! [`Backdrop`] owns the mount/resize/unmount contract. All per-mount state
//! lives inside [`Mount::Mounted`]; leaving that variant is the only way it
//! is released, so a backdrop is either fully built or holds nothing.
//!
//! The host drives time through [`Backdrop::pump`]. Each pump runs the blink
//! interval ticks that fell due and then at most one frame.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::config::BackdropConfig;
use crate::render::{ContainerHandle, DirtyFlags, FrameOutcome, RenderBackend, RenderError, RenderLoop, SceneState, Viewport};
use crate::runtime::scheduler::{Scheduler, Task, TimerKey};
use crate::scene::SceneError;
use crate::simulation::SimulationError;

/// Top-level errors surfaced to the host
#[derive(Error, Debug)]
pub enum BackdropError {
    /// Configuration failed to load or validate
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene construction failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Surface creation, upload or a halting frame failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Simulation state could not be created
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Result of a [`Backdrop::mount`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// A new scene was built
    Mounted,
    /// Already mounted; nothing was rebuilt
    AlreadyMounted,
}

/// Counters across the backdrop's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackdropStats {
    /// Successful mounts
    pub mounts: u64,
    /// Frames drawn
    pub frames_rendered: u64,
    /// Frames skipped after a failure
    pub frames_skipped: u64,
    /// Blink interval ticks handled
    pub blink_ticks: u64,
    /// Resizes applied while mounted
    pub resizes: u64,
}

/// Work done by one [`Backdrop::pump`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Frames drawn
    pub frames: u32,
    /// Frames skipped
    pub skipped: u32,
    /// Blink ticks handled
    pub blink_ticks: u32,
}

/// Live state of a mounted backdrop
#[derive(Debug)]
pub struct MountedBackdrop {
    container: ContainerHandle,
    viewport: Viewport,
    scene: SceneState,
    render_loop: RenderLoop,
    blink_timer: TimerKey,
}

impl MountedBackdrop {
    /// Host container
    pub fn container(&self) -> ContainerHandle {
        self.container
    }

    /// Current viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Animated scene
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// Frame loop
    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }
}

/// Mount state
#[derive(Debug)]
pub enum Mount {
    /// Nothing acquired
    Unmounted,
    /// Surface, scene, blink timer and render loop are live
    Mounted(Box<MountedBackdrop>),
}

/// The animated backdrop bound to one render backend
pub struct Backdrop<B: RenderBackend> {
    config: BackdropConfig,
    backend: B,
    scheduler: Scheduler,
    mount: Mount,
    stats: BackdropStats,
}

impl<B: RenderBackend> Backdrop<B> {
    /// Validate `config` and create an unmounted backdrop
    pub fn new(config: BackdropConfig, backend: B) -> Result<Self, BackdropError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            scheduler: Scheduler::new(),
            mount: Mount::Unmounted,
            stats: BackdropStats::default(),
        })
    }

    /// Acquire the surface and build the scene at host time `now`
    ///
    /// The blink period starts counting at `now`. A second mount without an
    /// intervening unmount is a no-op. On failure nothing stays acquired and
    /// the backdrop remains unmounted.
    pub fn mount(
        &mut self,
        container: ContainerHandle,
        viewport: Viewport,
        now: Duration,
    ) -> Result<MountOutcome, BackdropError> {
        if let Mount::Mounted(mounted) = &self.mount {
            log::debug!("Mount ignored: already mounted in {:?}", mounted.container);
            return Ok(MountOutcome::AlreadyMounted);
        }
        viewport.validate()?;

        let mut scene = SceneState::build(&self.config, viewport.aspect())?;
        self.backend
            .create_surface(container, viewport.surface_size(self.config.render.max_pixel_ratio))?;
        if let Err(error) = self.backend.upload_meshes(scene.buffers.meshes()) {
            self.backend.release();
            return Err(error.into());
        }
        scene.buffers.acknowledge(DirtyFlags::MESHES);

        self.scheduler.advance_to(now);
        let blink_timer = self.scheduler.set_interval(scene.blink.period());
        let mut render_loop = RenderLoop::new(&self.config.motion, self.config.render.frame_errors);
        render_loop.start(&mut self.scheduler);

        self.mount = Mount::Mounted(Box::new(MountedBackdrop { container, viewport, scene, render_loop, blink_timer }));
        self.stats.mounts += 1;
        log::info!(
            "Backdrop mounted in {:?} at {}x{} on the {} backend",
            container,
            viewport.width,
            viewport.height,
            self.backend.name()
        );
        Ok(MountOutcome::Mounted)
    }

    /// Apply a new viewport; ignored while unmounted
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), BackdropError> {
        let Mount::Mounted(mounted) = &mut self.mount else {
            log::debug!("Resize ignored while unmounted");
            return Ok(());
        };
        viewport.validate()?;
        self.backend
            .resize_surface(viewport.surface_size(self.config.render.max_pixel_ratio))?;
        mounted.scene.camera.set_aspect_ratio(viewport.aspect());
        mounted.scene.buffers.update_camera(&mounted.scene.camera);
        mounted.viewport = viewport;
        self.stats.resizes += 1;
        log::debug!("Backdrop resized to {}x{} (ratio {})", viewport.width, viewport.height, viewport.pixel_ratio);
        Ok(())
    }

    /// Stop the loop, cancel the blink timer and release everything
    ///
    /// Returns false when there was nothing mounted.
    pub fn unmount(&mut self) -> bool {
        let Mount::Mounted(mut mounted) = std::mem::replace(&mut self.mount, Mount::Unmounted) else {
            return false;
        };
        mounted.render_loop.stop(&mut self.scheduler);
        self.scheduler.clear_interval(mounted.blink_timer);
        mounted.scene.buffers.clear();
        self.backend.release();
        log::info!(
            "Backdrop unmounted from {:?} after {} frames",
            mounted.container,
            mounted.render_loop.frames_rendered()
        );
        true
    }

    /// Run everything due at host time `now`
    ///
    /// Blink ticks run first, then the pending frame. A frame failure is
    /// returned only under the halting policy.
    pub fn pump(&mut self, now: Duration) -> Result<PumpReport, BackdropError> {
        let tasks = self.scheduler.due_tasks(now);
        let mut report = PumpReport::default();
        let Mount::Mounted(mounted) = &mut self.mount else {
            return Ok(report);
        };

        for task in tasks {
            match task {
                Task::Interval(key) if key == mounted.blink_timer => {
                    mounted.scene.blink.tick();
                    mounted.scene.blink.apply(&mut mounted.scene.graph, &mounted.scene.drone)?;
                    report.blink_ticks += 1;
                    self.stats.blink_ticks += 1;
                }
                Task::Interval(key) => {
                    log::warn!("Dropping tick of unknown interval {key:?}");
                }
                Task::Frame(request) => {
                    let outcome = mounted.render_loop.run_frame(
                        request,
                        now,
                        &mut mounted.scene,
                        &mut self.backend,
                        &mut self.scheduler,
                    )?;
                    match outcome {
                        FrameOutcome::Rendered => {
                            report.frames += 1;
                            self.stats.frames_rendered += 1;
                        }
                        FrameOutcome::Skipped => {
                            report.skipped += 1;
                            self.stats.frames_skipped += 1;
                        }
                        FrameOutcome::Ignored => {}
                    }
                }
            }
        }
        Ok(report)
    }

    /// True while mounted
    pub fn is_mounted(&self) -> bool {
        matches!(self.mount, Mount::Mounted(_))
    }

    /// Mounted state, if any
    pub fn mounted(&self) -> Option<&MountedBackdrop> {
        match &self.mount {
            Mount::Mounted(mounted) => Some(mounted),
            Mount::Unmounted => None,
        }
    }

    /// Lifetime counters
    pub fn stats(&self) -> BackdropStats {
        self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    /// Render backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable render backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Scheduler driving frames and intervals
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl<B: RenderBackend> Drop for Backdrop<B> {
    fn drop(&mut self) {
        self.unmount();
    }
}
