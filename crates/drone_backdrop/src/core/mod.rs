//! Core crate configuration

pub mod config;

pub use config::{
    BackdropConfig, BlinkConfig, CameraConfig, DroneConfig, FrameErrorPolicy, FramePacing,
    MotionConfig, ParticleConfig, RenderConfig,
};
