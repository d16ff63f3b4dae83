//! Autonomous flight path
//!
//! The target position is a closed-form function of elapsed simulation time:
//! two sinusoids per axis with distinct periods. Each step the drone covers
//! a fixed fraction of the remaining distance; tilt is derived from the
//! remaining pursuit vector and yaw spins at a constant rate.

use crate::core::config::{DroneConfig, MotionConfig};
use crate::foundation::math::{EulerRotation, Transform, Vec3};
use crate::scene::{DroneModel, SceneError, SceneGraph};

/// Target drone position at elapsed time `t` in seconds
pub fn target_position(t: f32) -> Vec3 {
    Vec3::new(
        (0.4 * t).sin() * 2.5 + (0.7 * t).sin(),
        (0.3 * t).cos() * 1.5 + (0.5 * t).sin() * 0.5 + 1.5,
        (0.6 * t).sin() + (0.4 * t).cos() * 0.3,
    )
}

/// Current drone pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DronePose {
    /// World position
    pub position: Vec3,
    /// Pitch about X
    pub pitch: f32,
    /// Yaw about Y
    pub yaw: f32,
    /// Roll about Z
    pub roll: f32,
}

impl DronePose {
    /// Level pose at `position`
    pub fn at(position: Vec3) -> Self {
        Self { position, pitch: 0.0, yaw: 0.0, roll: 0.0 }
    }

    /// Local transform of the drone root
    pub fn to_transform(&self) -> Transform {
        Transform::from_position_rotation(self.position, EulerRotation::new(self.pitch, self.yaw, self.roll))
    }
}

/// Owns the drone pose, the simulation clock and the propeller spin
#[derive(Debug, Clone)]
pub struct MotionController {
    config: MotionConfig,
    pose: DronePose,
    propellers: [f32; 4],
    elapsed: f32,
}

impl MotionController {
    /// Start at the configured spawn position with time zero
    pub fn new(config: MotionConfig, drone: &DroneConfig) -> Self {
        let [x, y, z] = drone.spawn_position;
        Self {
            config,
            pose: DronePose::at(Vec3::new(x, y, z)),
            propellers: [0.0; 4],
            elapsed: 0.0,
        }
    }

    /// Advance the clock by `scale` reference steps and pursue the new target
    pub fn advance(&mut self, scale: f32) {
        self.elapsed += self.config.time_step * scale;
        let target = target_position(self.elapsed);
        self.pursue(target, scale);
    }

    /// Move toward a fixed `target` without touching the clock
    ///
    /// At `scale == 1` the remaining distance shrinks by exactly
    /// `1 - smoothing`. Larger scales compound the same per-step factor.
    pub fn pursue(&mut self, target: Vec3, scale: f32) {
        let alpha = 1.0 - (1.0 - self.config.smoothing).powf(scale);
        self.pose.position += (target - self.pose.position) * alpha;

        let pursuit = target - self.pose.position;
        self.pose.roll = -pursuit.x * self.config.roll_gain;
        self.pose.pitch = -pursuit.y * self.config.pitch_gain + pursuit.z * self.config.pitch_depth_gain;
        self.pose.yaw += self.config.yaw_rate * scale;

        let spin = self.config.propeller_rate * scale;
        for (i, angle) in self.propellers.iter_mut().enumerate() {
            *angle += if i % 2 == 0 { spin } else { -spin };
        }
    }

    /// Current pose
    pub fn pose(&self) -> &DronePose {
        &self.pose
    }

    /// Accumulated propeller angles in corner order
    pub fn propeller_angles(&self) -> [f32; 4] {
        self.propellers
    }

    /// Elapsed simulation time in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Write the pose and propeller angles into the drone's nodes
    pub fn apply(&self, graph: &mut SceneGraph, model: &DroneModel) -> Result<(), SceneError> {
        graph.set_transform(model.root, self.pose.to_transform())?;
        for (key, angle) in model.propellers.iter().zip(self.propellers) {
            let node = graph.node_mut(*key).ok_or(SceneError::UnknownNode(*key))?;
            node.transform.rotation.y = angle;
        }
        Ok(())
    }
}
