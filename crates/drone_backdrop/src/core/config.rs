//! # Backdrop Configuration
//!
//! All tunables of the backdrop in one place: particle field, flight path,
//! signal-light cadence, camera, drone geometry and renderer behaviour.
//! Defaults reproduce the shipped look; every section can be overridden
//! from a TOML or RON file through the [`Config`] trait.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Particle Field Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Number of particles
    pub count: usize,
    /// Per-component reflection bound
    pub bound: f32,
    /// Half-extent of the initial spawn cube (clamped to `bound`)
    pub spawn_extent: f32,
    /// Maximum per-component speed, in units per frame
    pub max_speed: f32,
    /// Rotation of the whole field about Y, in radians per frame
    pub field_spin: f32,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Point size in world units
    pub point_size: f32,
    /// Point colour as 0xRRGGBB
    pub color: u32,
    /// Point opacity
    pub opacity: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 2000,
            bound: 12.0,
            spawn_extent: 12.5,
            max_speed: 0.01,
            field_spin: 0.0006,
            seed: None,
            point_size: 0.08,
            color: 0x007d_d3fc,
            opacity: 0.65,
        }
    }
}

/// How simulation time advances between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FramePacing {
    /// Every frame advances by exactly `time_step`; speed follows the frame rate
    #[default]
    Fixed,
    /// Steps are scaled by real elapsed time relative to `time_step`
    RealTime,
}

/// # Motion Configuration
///
/// Flight-path smoothing, tilt gains and spin rates. Rates are per frame at
/// the reference `time_step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Fraction of the remaining distance covered per frame
    pub smoothing: f32,
    /// Roll gain applied to the X pursuit component
    pub roll_gain: f32,
    /// Pitch gain applied to the Y pursuit component
    pub pitch_gain: f32,
    /// Pitch gain applied to the Z pursuit component
    pub pitch_depth_gain: f32,
    /// Constant yaw increment per frame
    pub yaw_rate: f32,
    /// Propeller spin increment per frame
    pub propeller_rate: f32,
    /// Simulation seconds per reference frame
    pub time_step: f32,
    /// Pacing mode
    pub pacing: FramePacing,
    /// Upper bound on the real-time step scale (prevents huge jumps after stalls)
    pub max_step_scale: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.02,
            roll_gain: 0.4,
            pitch_gain: 0.3,
            pitch_depth_gain: 0.1,
            yaw_rate: 0.005,
            propeller_rate: 0.5,
            time_step: 0.016,
            pacing: FramePacing::Fixed,
            max_step_scale: 4.0,
        }
    }
}

/// # Signal Light Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Toggle period in milliseconds
    pub period_ms: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self { period_ms: 400 }
    }
}

/// # Camera Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Fixed camera position
    pub position: [f32; 3],
    /// Constant look-at point
    pub look_at: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 1.0, 8.0],
            look_at: [0.0, 1.0, 0.0],
        }
    }
}

/// # Drone Geometry Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    /// Distance of each motor from the body centre along X and Z
    pub motor_distance: f32,
    /// Length trimmed off each arm so it stops short of the motor
    pub arm_inset: f32,
    /// Initial drone position
    pub spawn_position: [f32; 3],
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            motor_distance: 0.7,
            arm_inset: 0.2,
            spawn_position: [0.0, 1.0, 0.0],
        }
    }
}

/// What the render loop does when a single frame fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrameErrorPolicy {
    /// Log the failure, count it and keep the loop scheduled
    #[default]
    LogAndSkip,
    /// Stop the loop and surface the error to the host
    Halt,
}

/// # Renderer Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clear colour as 0xRRGGBB
    pub background: u32,
    /// Device pixel ratio cap applied to the output surface
    pub max_pixel_ratio: f32,
    /// Ambient light intensity
    pub ambient_intensity: f32,
    /// Directional light position (light shines toward the origin)
    pub light_position: [f32; 3],
    /// Directional light intensity
    pub light_intensity: f32,
    /// Per-frame failure policy
    pub frame_errors: FrameErrorPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: 0x00f0_f9ff,
            max_pixel_ratio: 2.0,
            ambient_intensity: 0.8,
            light_position: [5.0, 10.0, 5.0],
            light_intensity: 1.0,
            frame_errors: FrameErrorPolicy::LogAndSkip,
        }
    }
}

/// # Complete Backdrop Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Particle field settings
    pub particles: ParticleConfig,
    /// Flight path settings
    pub motion: MotionConfig,
    /// Signal light settings
    pub blink: BlinkConfig,
    /// Camera settings
    pub camera: CameraConfig,
    /// Drone geometry settings
    pub drone: DroneConfig,
    /// Renderer settings
    pub render: RenderConfig,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            particles: ParticleConfig::default(),
            motion: MotionConfig::default(),
            blink: BlinkConfig::default(),
            camera: CameraConfig::default(),
            drone: DroneConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

impl BackdropConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let particles = &self.particles;
        if particles.count == 0 {
            return Err(invalid("particle count must be at least 1"));
        }
        if !(particles.bound > 0.0) {
            return Err(invalid("particle bound must be positive"));
        }
        if particles.spawn_extent < 0.0 || particles.max_speed < 0.0 {
            return Err(invalid("particle spawn extent and speed must not be negative"));
        }

        let motion = &self.motion;
        if !(motion.smoothing > 0.0 && motion.smoothing <= 1.0) {
            return Err(invalid("motion smoothing must be in (0, 1]"));
        }
        if !(motion.time_step > 0.0) {
            return Err(invalid("motion time step must be positive"));
        }
        if motion.max_step_scale < 1.0 {
            return Err(invalid("max step scale must be at least 1"));
        }

        if self.blink.period_ms == 0 {
            return Err(invalid("blink period must be at least 1 ms"));
        }

        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(invalid("camera fov must be in (0, 180) degrees"));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(invalid("camera planes must satisfy 0 < near < far"));
        }
        if camera.position == camera.look_at {
            return Err(invalid("camera position and look-at point must differ"));
        }

        if self.drone.arm_inset < 0.0
            || self.drone.motor_distance * std::f32::consts::SQRT_2 <= self.drone.arm_inset
        {
            return Err(invalid("motor distance too small for the arm inset"));
        }

        if self.render.max_pixel_ratio <= 0.0 {
            return Err(invalid("max pixel ratio must be positive"));
        }

        Ok(())
    }
}

impl Config for BackdropConfig {}
