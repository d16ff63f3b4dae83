//! Frame loop state machine
//!
//! `Unstarted -> Running -> Stopped`. While running, the loop keeps exactly
//! one frame request outstanding with the scheduler; each fired request
//! advances the simulation, restages the buffers, issues one draw and
//! requests the next frame.

use std::time::Duration;

use crate::core::config::{BackdropConfig, FrameErrorPolicy, FramePacing, MotionConfig};
use crate::foundation::math::Vec3;
use crate::foundation::time::FrameTimer;
use crate::render::{Camera, DirtyFlags, FrameStyle, RenderBackend, RenderBuffers, RenderError};
use crate::runtime::scheduler::{FrameRequest, Scheduler};
use crate::scene::{DroneModel, DroneModelBuilder, SceneError, SceneGraph};
use crate::simulation::{BlinkController, MotionController, ParticleField};

/// Everything a mounted backdrop animates and draws
#[derive(Debug)]
pub struct SceneState {
    /// Scene hierarchy
    pub graph: SceneGraph,
    /// Handles into the drone
    pub drone: DroneModel,
    /// Particle cloud
    pub particles: ParticleField,
    /// Drone pose and propellers
    pub motion: MotionController,
    /// Beacon state
    pub blink: BlinkController,
    /// Fixed camera
    pub camera: Camera,
    /// Point the camera is re-aimed at every frame
    pub look_at: Vec3,
    /// Staged frame data
    pub buffers: RenderBuffers,
}

impl SceneState {
    /// Build the scene and stage its first frame
    pub fn build(config: &BackdropConfig, aspect: f32) -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new();
        let drone = DroneModelBuilder::new(config.drone.clone()).build(&mut graph)?;
        let particles = ParticleField::new(&config.particles);
        let motion = MotionController::new(config.motion.clone(), &config.drone);
        let blink = BlinkController::new(&config.blink);
        motion.apply(&mut graph, &drone)?;
        blink.apply(&mut graph, &drone)?;

        let camera = Camera::from_config(&config.camera, aspect);
        let look_at = camera.target;
        let mut buffers = RenderBuffers::new(FrameStyle::from_config(&config.render, &config.particles));
        buffers.update_instances(&graph);
        buffers.update_particles(&particles);
        buffers.update_camera(&camera);

        log::debug!(
            "Scene built: {} nodes, {} particles, {} meshes",
            graph.len(),
            particles.len(),
            buffers.meshes().len()
        );
        Ok(Self { graph, drone, particles, motion, blink, camera, look_at, buffers })
    }

    /// Advance the simulation by `scale` reference steps and restage the buffers
    pub fn advance(&mut self, scale: f32) -> Result<(), SceneError> {
        self.particles.advance(scale);
        self.motion.advance(scale);
        self.motion.apply(&mut self.graph, &self.drone)?;
        self.camera.look_at(self.look_at, Vec3::y());

        self.buffers.update_particles(&self.particles);
        self.buffers.update_instances(&self.graph);
        self.buffers.update_camera(&self.camera);
        Ok(())
    }

    /// Upload pending meshes and draw the staged frame
    pub fn draw<B: RenderBackend>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        if self.buffers.dirty().contains(DirtyFlags::MESHES) {
            backend.upload_meshes(self.buffers.meshes())?;
            self.buffers.acknowledge(DirtyFlags::MESHES);
        }
        backend.draw(&self.buffers.frame())?;
        self.buffers.mark_clean();
        Ok(())
    }
}

/// Render loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created, never started
    Unstarted,
    /// A frame request is outstanding
    Running,
    /// Stopped; no further frames
    Stopped,
}

/// What happened to a fired frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was drawn
    Rendered,
    /// The frame failed and was skipped
    Skipped,
    /// The request was stale or the loop is not running
    Ignored,
}

/// Drives one frame per fired request
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    pending: Option<FrameRequest>,
    timer: FrameTimer,
    pacing: FramePacing,
    time_step: f32,
    max_step_scale: f32,
    policy: FrameErrorPolicy,
    frames_rendered: u64,
    frames_skipped: u64,
}

impl RenderLoop {
    /// Unstarted loop with the given pacing and failure policy
    pub fn new(motion: &MotionConfig, policy: FrameErrorPolicy) -> Self {
        Self {
            state: LoopState::Unstarted,
            pending: None,
            timer: FrameTimer::new(),
            pacing: motion.pacing,
            time_step: motion.time_step,
            max_step_scale: motion.max_step_scale,
            policy,
            frames_rendered: 0,
            frames_skipped: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Outstanding frame request
    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Frames drawn
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Frames that failed under [`FrameErrorPolicy::LogAndSkip`]
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Frame timing
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Move to `Running` and request the first frame; false unless unstarted
    pub fn start(&mut self, scheduler: &mut Scheduler) -> bool {
        if self.state != LoopState::Unstarted {
            log::debug!("Render loop start ignored in state {:?}", self.state);
            return false;
        }
        self.state = LoopState::Running;
        self.pending = Some(scheduler.request_frame());
        log::debug!("Render loop started");
        true
    }

    /// Move to `Stopped` and cancel the outstanding request; a no-op when already stopped
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(request) = self.pending.take() {
            scheduler.cancel_frame(request);
        }
        if self.state != LoopState::Stopped {
            log::debug!(
                "Render loop stopped after {} frames ({} skipped)",
                self.frames_rendered,
                self.frames_skipped
            );
            self.state = LoopState::Stopped;
        }
    }

    /// Run the frame for a fired `request` at host time `now`
    ///
    /// Failures are handled according to the loop's policy: skipped frames
    /// keep the loop scheduled, a halting failure stops it and is returned.
    pub fn run_frame<B: RenderBackend>(
        &mut self,
        request: FrameRequest,
        now: Duration,
        scene: &mut SceneState,
        backend: &mut B,
        scheduler: &mut Scheduler,
    ) -> Result<FrameOutcome, RenderError> {
        if self.state != LoopState::Running || self.pending != Some(request) {
            log::trace!("Ignoring frame request {:?} in state {:?}", request, self.state);
            return Ok(FrameOutcome::Ignored);
        }
        self.pending = None;

        let dt = self.timer.tick(now);
        let scale = self.step_scale(dt);
        let result = scene.advance(scale).map_err(RenderError::from).and_then(|()| scene.draw(backend));

        match result {
            Ok(()) => {
                self.frames_rendered += 1;
                log::trace!("Frame {} rendered (dt {:.4}s, scale {:.2})", self.frames_rendered, dt, scale);
                self.pending = Some(scheduler.request_frame());
                Ok(FrameOutcome::Rendered)
            }
            Err(error) => match self.policy {
                FrameErrorPolicy::LogAndSkip => {
                    self.frames_skipped += 1;
                    log::error!("Frame skipped: {error}");
                    self.pending = Some(scheduler.request_frame());
                    Ok(FrameOutcome::Skipped)
                }
                FrameErrorPolicy::Halt => {
                    log::error!("Frame failed, halting render loop: {error}");
                    self.state = LoopState::Stopped;
                    Err(error)
                }
            },
        }
    }

    fn step_scale(&self, dt: f32) -> f32 {
        match self.pacing {
            FramePacing::Fixed => 1.0,
            FramePacing::RealTime if dt > 0.0 => (dt / self.time_step).min(self.max_step_scale),
            FramePacing::RealTime => 1.0,
        }
    }
}
