//! Headless backend that records every call
//!
//! Used wherever the backdrop runs without a display: tests and
//! instrumentation. Failures can be injected for surface creation and for
//! the next N draws.

use crate::foundation::math::Mat4;
use crate::render::{BackendResult, ContainerHandle, DirtyFlags, FrameData, RenderBackend, RenderError};
use crate::scene::Primitive;

/// Call counters and the last observed frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendCalls {
    /// Successful surface creations
    pub surfaces_created: u32,
    /// Successful surface resizes
    pub resizes: u32,
    /// Mesh table uploads
    pub mesh_uploads: u32,
    /// Successful draws
    pub draws: u64,
    /// Draws that were made to fail
    pub failed_draws: u64,
    /// Releases that freed a live surface
    pub releases: u32,
    /// Particle bytes uploaded across all draws that carried particle changes
    pub particle_bytes: u64,
    /// Instance count of the last successful draw
    pub last_instance_count: usize,
    /// Projection matrix of the last successful draw
    pub last_projection: Option<Mat4>,
}

/// Backend with no output that counts what it is asked to do
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    calls: BackendCalls,
    surface: Option<(ContainerHandle, (u32, u32))>,
    meshes: usize,
    refuse_surface: bool,
    failing_draws: u32,
}

impl RecordingBackend {
    /// Backend that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose surface creation always fails
    pub fn without_surface_support() -> Self {
        Self { refuse_surface: true, ..Self::default() }
    }

    /// Make the next `count` draws fail
    pub fn fail_next_draws(&mut self, count: u32) {
        self.failing_draws = count;
    }

    /// Recorded calls
    pub fn calls(&self) -> &BackendCalls {
        &self.calls
    }

    /// Container the current surface is attached to
    pub fn container(&self) -> Option<ContainerHandle> {
        self.surface.map(|(container, _)| container)
    }

    /// Size of the current mesh table
    pub fn mesh_count(&self) -> usize {
        self.meshes
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_surface(&mut self, container: ContainerHandle, size: (u32, u32)) -> BackendResult<()> {
        if self.refuse_surface {
            return Err(RenderError::InitializationFailed("no rendering backend available".to_string()));
        }
        self.surface = Some((container, size));
        self.calls.surfaces_created += 1;
        Ok(())
    }

    fn resize_surface(&mut self, size: (u32, u32)) -> BackendResult<()> {
        let surface = self.surface.as_mut().ok_or(RenderError::NoSurface)?;
        surface.1 = size;
        self.calls.resizes += 1;
        Ok(())
    }

    fn surface_extent(&self) -> Option<(u32, u32)> {
        self.surface.map(|(_, size)| size)
    }

    fn upload_meshes(&mut self, meshes: &[Primitive]) -> BackendResult<()> {
        if self.surface.is_none() {
            return Err(RenderError::NoSurface);
        }
        self.meshes = meshes.len();
        self.calls.mesh_uploads += 1;
        Ok(())
    }

    fn draw(&mut self, frame: &FrameData<'_>) -> BackendResult<()> {
        if self.surface.is_none() {
            return Err(RenderError::NoSurface);
        }
        if self.failing_draws > 0 {
            self.failing_draws -= 1;
            self.calls.failed_draws += 1;
            return Err(RenderError::RenderingFailed("injected draw failure".to_string()));
        }
        if frame.dirty.contains(DirtyFlags::PARTICLES) {
            self.calls.particle_bytes += frame.particle_bytes().len() as u64;
        }
        self.calls.draws += 1;
        self.calls.last_instance_count = frame.instances.len();
        self.calls.last_projection = Some(frame.projection);
        Ok(())
    }

    fn release(&mut self) {
        if self.surface.take().is_some() {
            self.calls.releases += 1;
        }
        self.meshes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ParticleConfig, RenderConfig};
    use crate::render::{FrameStyle, RenderBuffers};

    #[test]
    fn test_refuses_surface_when_configured() {
        let mut backend = RecordingBackend::without_surface_support();
        assert!(matches!(
            backend.create_surface(ContainerHandle(1), (10, 10)),
            Err(RenderError::InitializationFailed(_))
        ));
        assert_eq!(backend.calls().surfaces_created, 0);
    }

    #[test]
    fn test_injected_draw_failures_run_out() {
        let mut backend = RecordingBackend::new();
        backend.create_surface(ContainerHandle(1), (10, 10)).unwrap();
        let buffers = RenderBuffers::new(FrameStyle::from_config(&RenderConfig::default(), &ParticleConfig::default()));

        backend.fail_next_draws(2);
        assert!(backend.draw(&buffers.frame()).is_err());
        assert!(backend.draw(&buffers.frame()).is_err());
        assert!(backend.draw(&buffers.frame()).is_ok());
        assert_eq!(backend.calls().failed_draws, 2);
        assert_eq!(backend.calls().draws, 1);
    }

    #[test]
    fn test_release_counts_once() {
        let mut backend = RecordingBackend::new();
        backend.create_surface(ContainerHandle(3), (10, 10)).unwrap();
        assert_eq!(backend.container(), Some(ContainerHandle(3)));
        backend.release();
        backend.release();
        assert_eq!(backend.calls().releases, 1);
        assert!(backend.resize_surface((5, 5)).is_err());
    }
}
