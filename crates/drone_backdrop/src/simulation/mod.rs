//! Per-frame and per-tick state: particle field, flight path and signal lights
//!
//! Each controller owns a disjoint slice of the animated state. The render
//! loop drives [`ParticleField`] and [`MotionController`] once per frame; the
//! blink timer drives [`BlinkController`] on its own period.

pub mod blink;
pub mod motion;
pub mod particles;

pub use blink::{BlinkController, LightState};
pub use motion::{target_position, DronePose, MotionController};
pub use particles::ParticleField;

use thiserror::Error;

/// Errors raised while constructing simulation state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Position and velocity buffers differ in length
    #[error("Particle buffers are misaligned: {positions} positions, {velocities} velocities")]
    MisalignedBuffers {
        /// Number of positions
        positions: usize,
        /// Number of velocities
        velocities: usize,
    },

    /// The reflection bound is not a positive finite number
    #[error("Invalid particle bound {0}")]
    InvalidBound(f32),
}
