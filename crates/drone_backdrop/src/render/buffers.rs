//! Per-frame staging buffers
//!
//! Collects everything a backend needs for one draw: the mesh table, one
//! instance per visible renderable node, the particle positions and the
//! camera matrices. [`DirtyFlags`] record which regions changed since the
//! last successful draw so backends can skip redundant uploads.

use bitflags::bitflags;

use crate::core::config::{ParticleConfig, RenderConfig};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::Camera;
use crate::scene::{Color, Primitive, SceneGraph, SurfaceMaterial};
use crate::simulation::ParticleField;

bitflags! {
    /// Buffer regions changed since the last draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u32 {
        /// Mesh table grew; meshes need uploading
        const MESHES = 1 << 0;
        /// Particle positions or the field transform changed
        const PARTICLES = 1 << 1;
        /// Instance transforms or visibility changed
        const INSTANCES = 1 << 2;
        /// Projection or view changed
        const PROJECTION = 1 << 3;
    }
}

/// One visible renderable node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInstance {
    /// Index into the mesh table
    pub mesh: usize,
    /// Surface description
    pub material: SurfaceMaterial,
}

/// Static look of a frame: background, lights and particle style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStyle {
    /// Clear colour
    pub background: Color,
    /// Ambient light intensity
    pub ambient: f32,
    /// Unit vector pointing from the scene toward the directional light
    pub light_direction: Vec3,
    /// Directional light intensity
    pub light_intensity: f32,
    /// Particle colour
    pub particle_color: Color,
    /// Particle size in world units
    pub particle_size: f32,
    /// Particle opacity
    pub particle_opacity: f32,
}

impl FrameStyle {
    /// Style from the render and particle configuration
    pub fn from_config(render: &RenderConfig, particles: &ParticleConfig) -> Self {
        let [x, y, z] = render.light_position;
        let light = Vec3::new(x, y, z);
        Self {
            background: Color::from_hex(render.background),
            ambient: render.ambient_intensity,
            light_direction: light.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y),
            light_intensity: render.light_intensity,
            particle_color: Color::from_hex(particles.color),
            particle_size: particles.point_size,
            particle_opacity: particles.opacity,
        }
    }
}

/// Borrowed view of one frame handed to a backend
#[derive(Debug, Clone, Copy)]
pub struct FrameData<'a> {
    /// Regions changed since the last draw
    pub dirty: DirtyFlags,
    /// Mesh table
    pub meshes: &'a [Primitive],
    /// Visible instances, index-aligned with `transforms`
    pub instances: &'a [DrawInstance],
    /// Column-major world matrices, one per instance
    pub transforms: &'a [[[f32; 4]; 4]],
    /// Particle positions in field space
    pub particles: &'a [[f32; 3]],
    /// Field-to-world matrix of the particle cloud
    pub particle_model: Mat4,
    /// World-to-view matrix
    pub view: Mat4,
    /// View-to-clip matrix
    pub projection: Mat4,
    /// Frame look
    pub style: &'a FrameStyle,
}

impl FrameData<'_> {
    /// Raw bytes of the instance transforms
    pub fn transform_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.transforms)
    }

    /// Raw bytes of the particle positions
    pub fn particle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.particles)
    }
}

/// CPU-side staging for one backend
#[derive(Debug, Clone)]
pub struct RenderBuffers {
    style: FrameStyle,
    meshes: Vec<Primitive>,
    instances: Vec<DrawInstance>,
    transforms: Vec<[[f32; 4]; 4]>,
    particles: Vec<[f32; 3]>,
    particle_model: Mat4,
    view: Mat4,
    projection: Mat4,
    dirty: DirtyFlags,
}

impl RenderBuffers {
    /// Empty buffers with everything marked dirty
    pub fn new(style: FrameStyle) -> Self {
        Self {
            style,
            meshes: Vec::new(),
            instances: Vec::new(),
            transforms: Vec::new(),
            particles: Vec::new(),
            particle_model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            dirty: DirtyFlags::all(),
        }
    }

    /// Rebuild the instance list from the visible part of the scene
    pub fn update_instances(&mut self, graph: &SceneGraph) {
        self.instances.clear();
        self.transforms.clear();
        for visit in graph.traverse() {
            let Some(renderable) = visit.renderable() else {
                continue;
            };
            let mesh = match self.meshes.iter().position(|m| *m == renderable.primitive) {
                Some(index) => index,
                None => {
                    self.meshes.push(renderable.primitive);
                    self.dirty |= DirtyFlags::MESHES;
                    self.meshes.len() - 1
                }
            };
            self.instances.push(DrawInstance { mesh, material: renderable.material });
            self.transforms.push(visit.world.into());
        }
        self.dirty |= DirtyFlags::INSTANCES;
    }

    /// Copy the particle positions and field transform
    pub fn update_particles(&mut self, field: &ParticleField) {
        self.particles.clear();
        self.particles.extend_from_slice(field.positions());
        self.particle_model = field.model_matrix();
        self.dirty |= DirtyFlags::PARTICLES;
    }

    /// Take the camera matrices, flagging a change only when they differ
    pub fn update_camera(&mut self, camera: &Camera) {
        let view = camera.get_view_matrix();
        let projection = camera.get_projection_matrix();
        if view != self.view || projection != self.projection {
            self.view = view;
            self.projection = projection;
            self.dirty |= DirtyFlags::PROJECTION;
        }
    }

    /// Mesh table
    pub fn meshes(&self) -> &[Primitive] {
        &self.meshes
    }

    /// Instances staged for the next draw
    pub fn instances(&self) -> &[DrawInstance] {
        &self.instances
    }

    /// Pending dirty regions
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Borrow the staged frame
    pub fn frame(&self) -> FrameData<'_> {
        FrameData {
            dirty: self.dirty,
            meshes: &self.meshes,
            instances: &self.instances,
            transforms: &self.transforms,
            particles: &self.particles,
            particle_model: self.particle_model,
            view: self.view,
            projection: self.projection,
            style: &self.style,
        }
    }

    /// Clear specific dirty flags once the backend has consumed them
    pub fn acknowledge(&mut self, flags: DirtyFlags) {
        self.dirty.remove(flags);
    }

    /// Clear dirty flags after a successful draw
    pub fn mark_clean(&mut self) {
        self.dirty = DirtyFlags::empty();
    }

    /// Drop all staged data and mark everything dirty again
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.instances.clear();
        self.transforms.clear();
        self.particles.clear();
        self.dirty = DirtyFlags::all();
    }
}
