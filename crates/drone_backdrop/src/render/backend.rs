//! Backend abstraction for the renderer
//!
//! A backend owns one output surface attached to a host container, the
//! uploaded meshes, and whatever it needs to turn a [`FrameData`] into
//! pixels.

use crate::render::{FrameData, RenderError};
use crate::scene::Primitive;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Opaque handle to the host container the surface is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle(pub u64);

/// Rendering backend trait
pub trait RenderBackend {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Create the output surface inside `container` at `size` physical pixels
    fn create_surface(&mut self, container: ContainerHandle, size: (u32, u32)) -> BackendResult<()>;

    /// Resize the existing output surface
    fn resize_surface(&mut self, size: (u32, u32)) -> BackendResult<()>;

    /// Current surface size, `None` when no surface exists
    fn surface_extent(&self) -> Option<(u32, u32)>;

    /// Replace the mesh table; instance `mesh` indices refer into it
    fn upload_meshes(&mut self, meshes: &[Primitive]) -> BackendResult<()>;

    /// Draw one frame
    fn draw(&mut self, frame: &FrameData<'_>) -> BackendResult<()>;

    /// Free the surface and every uploaded resource; safe to call twice
    fn release(&mut self);
}
