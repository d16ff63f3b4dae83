//! # Drone Backdrop
//!
//! An animated 3D background: a procedurally assembled quadcopter flying an
//! autonomous, smoothed path above a slowly drifting particle field, with
//! alternating signal beacons.
//!
//! ## Features
//!
//! - **Scene Graph**: slot-arena transform hierarchy with lazy traversal
//! - **Declarative Model**: the drone is a table of parts fed to a generic builder
//! - **Simulation**: bounded particle field, closed-form flight path, beacon timer
//! - **Pluggable Rendering**: software rasteriser and a headless recording backend
//! - **Explicit Lifecycle**: mount, resize and unmount with no double initialisation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use drone_backdrop::prelude::*;
//!
//! fn main() -> Result<(), BackdropError> {
//!     let mut backdrop = Backdrop::new(BackdropConfig::default(), SoftwareBackend::new())?;
//!     backdrop.mount(ContainerHandle(1), Viewport::new(1280, 720), Duration::ZERO)?;
//!
//!     // One pump per display refresh
//!     for frame in 1..=60_u64 {
//!         backdrop.pump(Duration::from_millis(frame * 16))?;
//!     }
//!
//!     backdrop.unmount();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod simulation;

/// Common imports for backdrop hosts
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{BackdropConfig, FrameErrorPolicy, FramePacing},
        foundation::math::{Mat4, Transform, Vec3},
        render::{Camera, ContainerHandle, RecordingBackend, RenderBackend, RenderError, SoftwareBackend, Viewport},
        runtime::{Backdrop, BackdropError, BackdropStats, MountOutcome, PumpReport},
        scene::{DroneModel, DroneModelBuilder, PrimitiveFactory, SceneGraph},
        simulation::{BlinkController, MotionController, ParticleField},
    };
}
