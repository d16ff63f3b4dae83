//! # Rendering
//!
//! Turns the animated scene into draw calls on a pluggable backend.
//!
//! ## Architecture
//!
//! - **Viewport / Camera**: host size and the fixed perspective camera
//! - **RenderBuffers**: per-frame staging of instance transforms, particle
//!   positions and camera matrices with dirty tracking
//! - **RenderBackend**: surface lifecycle, mesh upload and one draw per frame
//! - **SoftwareBackend**: CPU point-splat rasteriser writing an RGBA image
//! - **RecordingBackend**: headless backend that records every call
//! - **RenderLoop**: unstarted/running/stopped frame state machine

pub mod backend;
pub mod buffers;
pub mod camera;
pub mod recording;
pub mod render_loop;
pub mod software;
pub mod viewport;

pub use backend::{BackendResult, ContainerHandle, RenderBackend};
pub use buffers::{DirtyFlags, DrawInstance, FrameData, FrameStyle, RenderBuffers};
pub use camera::Camera;
pub use recording::{BackendCalls, RecordingBackend};
pub use render_loop::{FrameOutcome, LoopState, RenderLoop, SceneState};
pub use software::SoftwareBackend;
pub use viewport::Viewport;

use thiserror::Error;

use crate::scene::SceneError;

/// Rendering error types
#[derive(Error, Debug)]
pub enum RenderError {
    /// The output surface could not be created
    ///
    /// Typically there is no usable backend for the container.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A draw failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Mesh or buffer upload failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A surface operation was issued with no surface attached
    #[error("No output surface")]
    NoSurface,

    /// Viewport with zero area or an unusable pixel ratio
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// Scene update failed while preparing a frame
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Image encoding or file output failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
