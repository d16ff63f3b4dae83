//! CPU point-splat rasteriser
//!
//! Each mesh is sampled once into surface points with normals at upload
//! time. A frame clears an RGBA image to the background colour, splats every
//! sample of every opaque instance with a depth test and Lambert shading,
//! then blends translucent instances and finally the particle cloud on top.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::foundation::math::{Mat4, Mat4Ext, Point3, Vec3};
use crate::render::{BackendResult, ContainerHandle, FrameData, RenderBackend, RenderError};
use crate::scene::{Color, Primitive, Shading, SurfaceMaterial, SurfaceSample};

/// World-space footprint of one surface sample
const SAMPLE_FOOTPRINT: f32 = 0.03;
/// Largest splat radius in pixels
const MAX_SPLAT_RADIUS: i32 = 8;

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

struct Surface {
    container: ContainerHandle,
    color: RgbaImage,
    depth: Vec<f32>,
}

impl Surface {
    fn new(container: ContainerHandle, (width, height): (u32, u32)) -> Self {
        Self {
            container,
            color: RgbaImage::new(width, height),
            depth: vec![f32::INFINITY; pixel_count(width, height)],
        }
    }

    fn clear(&mut self, background: Color) {
        let pixel = Rgba(background.to_rgba8(1.0));
        for p in self.color.pixels_mut() {
            *p = pixel;
        }
        self.depth.fill(f32::INFINITY);
    }
}

/// Screen-space projection of a point
struct Projected {
    x: f32,
    y: f32,
    depth: f32,
    focal: f32,
}

/// Software backend rendering into an in-memory image
#[derive(Default)]
pub struct SoftwareBackend {
    surface: Option<Surface>,
    meshes: Vec<Vec<SurfaceSample>>,
    frames_drawn: u64,
}

impl std::fmt::Debug for SoftwareBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareBackend")
            .field("surface", &self.surface_extent())
            .field("meshes", &self.meshes.len())
            .field("frames_drawn", &self.frames_drawn)
            .finish()
    }
}

impl SoftwareBackend {
    /// Backend with no surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered image
    pub fn image(&self) -> Option<&RgbaImage> {
        self.surface.as_ref().map(|s| &s.color)
    }

    /// Number of frames drawn since creation
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Write the last rendered image as PNG
    pub fn snapshot(&self, path: impl AsRef<Path>) -> BackendResult<()> {
        let surface = self.surface.as_ref().ok_or(RenderError::NoSurface)?;
        surface.color.save(path.as_ref())?;
        log::info!("Saved {}x{} snapshot to {}", surface.color.width(), surface.color.height(), path.as_ref().display());
        Ok(())
    }

    fn shade(material: &SurfaceMaterial, normal: Vec3, frame: &FrameData<'_>) -> Color {
        match material.shading {
            Shading::Unlit => material.color,
            Shading::Lit => {
                let style = frame.style;
                let diffuse = normal.dot(&style.light_direction).max(0.0) * style.light_intensity;
                // Metals reflect less diffuse light
                let diffuse = diffuse * (1.0 - 0.5 * material.metalness);
                material.color.scaled(style.ambient * 0.5 + diffuse)
            }
        }
    }

    fn draw_instances(surface: &mut Surface, meshes: &[Vec<SurfaceSample>], frame: &FrameData<'_>, transparent: bool) {
        let view_projection = frame.projection * frame.view;
        for (instance, transform) in frame.instances.iter().zip(frame.transforms) {
            if instance.material.is_transparent() != transparent {
                continue;
            }
            let Some(samples) = meshes.get(instance.mesh) else {
                continue;
            };
            let model = Mat4::from(*transform);
            let normal_matrix = model.linear_part();
            let mvp = view_projection * model;
            for sample in samples {
                let Some(projected) = project(&mvp, sample.position, surface.color.dimensions()) else {
                    continue;
                };
                let normal = (normal_matrix * sample.normal).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
                let color = Self::shade(&instance.material, normal, frame);
                let radius = splat_radius(SAMPLE_FOOTPRINT, &projected);
                splat(surface, &projected, radius, color, instance.material.opacity, !transparent);
            }
        }
    }

    fn draw_particles(surface: &mut Surface, frame: &FrameData<'_>) {
        let mvp = frame.projection * frame.view * frame.particle_model;
        let style = frame.style;
        for position in frame.particles {
            let point = Vec3::new(position[0], position[1], position[2]);
            if let Some(projected) = project(&mvp, point, surface.color.dimensions()) {
                let radius = splat_radius(style.particle_size, &projected);
                splat(surface, &projected, radius, style.particle_color, style.particle_opacity, false);
            }
        }
    }
}

fn project(mvp: &Mat4, point: Vec3, (width, height): (u32, u32)) -> Option<Projected> {
    let clip = mvp * Point3::from(point).to_homogeneous();
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    if ndc.z.abs() > 1.0 {
        return None;
    }
    Some(Projected {
        x: (ndc.x * 0.5 + 0.5) * width as f32,
        y: (0.5 - ndc.y * 0.5) * height as f32,
        depth: ndc.z,
        focal: mvp_focal(mvp, height) / clip.w,
    })
}

/// Pixels per world unit at unit clip depth
fn mvp_focal(mvp: &Mat4, height: u32) -> f32 {
    let row = mvp.row(1);
    Vec3::new(row[0], row[1], row[2]).norm() * height as f32 * 0.5
}

fn splat_radius(world_size: f32, projected: &Projected) -> i32 {
    ((world_size * projected.focal * 0.5).ceil() as i32).clamp(1, MAX_SPLAT_RADIUS)
}

fn splat(surface: &mut Surface, at: &Projected, radius: i32, color: Color, opacity: f32, write_depth: bool) {
    let (width, height) = surface.color.dimensions();
    let cx = at.x as i32;
    let cy = at.y as i32;
    let source = color.to_array(opacity);
    for dy in -radius + 1..radius {
        for dx in -radius + 1..radius {
            if dx * dx + dy * dy >= radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }
            let index = pixel_index(x as u32, y as u32, width);
            if at.depth >= surface.depth[index] {
                continue;
            }
            if write_depth {
                surface.depth[index] = at.depth;
            }
            let pixel = surface.color.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let dst = f32::from(pixel.0[channel]) / 255.0;
                let blended = source[channel] * source[3] + dst * (1.0 - source[3]);
                pixel.0[channel] = (blended.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software"
    }

    fn create_surface(&mut self, container: ContainerHandle, size: (u32, u32)) -> BackendResult<()> {
        if size.0 == 0 || size.1 == 0 {
            return Err(RenderError::InitializationFailed(format!("cannot create a {}x{} surface", size.0, size.1)));
        }
        self.surface = Some(Surface::new(container, size));
        log::info!("Software surface {}x{} created for container {:?}", size.0, size.1, container);
        Ok(())
    }

    fn resize_surface(&mut self, size: (u32, u32)) -> BackendResult<()> {
        let container = self.surface.as_ref().ok_or(RenderError::NoSurface)?.container;
        self.surface = Some(Surface::new(container, size));
        log::debug!("Software surface resized to {}x{}", size.0, size.1);
        Ok(())
    }

    fn surface_extent(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(|s| s.color.dimensions())
    }

    fn upload_meshes(&mut self, meshes: &[Primitive]) -> BackendResult<()> {
        self.meshes = meshes.iter().map(Primitive::surface_samples).collect();
        log::debug!(
            "Uploaded {} meshes ({} surface samples)",
            self.meshes.len(),
            self.meshes.iter().map(Vec::len).sum::<usize>()
        );
        Ok(())
    }

    fn draw(&mut self, frame: &FrameData<'_>) -> BackendResult<()> {
        let surface = self.surface.as_mut().ok_or(RenderError::NoSurface)?;
        if frame.instances.len() != frame.transforms.len() {
            return Err(RenderError::RenderingFailed(format!(
                "{} instances but {} transforms",
                frame.instances.len(),
                frame.transforms.len()
            )));
        }
        surface.clear(frame.style.background);
        Self::draw_instances(surface, &self.meshes, frame, false);
        Self::draw_instances(surface, &self.meshes, frame, true);
        Self::draw_particles(surface, frame);
        self.frames_drawn += 1;
        Ok(())
    }

    fn release(&mut self) {
        if self.surface.take().is_some() {
            log::info!("Software surface released");
        }
        self.meshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CameraConfig, ParticleConfig, RenderConfig};
    use crate::foundation::math::Transform;
    use crate::render::{Camera, FrameStyle, RenderBuffers};
    use crate::scene::{PrimitiveFactory, Renderable, SceneGraph};

    fn staged_cube() -> RenderBuffers {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .spawn(
                "cube",
                Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
                Some(Renderable {
                    primitive: PrimitiveFactory::cuboid(1.0, 1.0, 1.0),
                    material: PrimitiveFactory::standard(0xff0000, 0.0, 1.0),
                }),
                root,
            )
            .unwrap();
        let mut buffers = RenderBuffers::new(FrameStyle::from_config(&RenderConfig::default(), &ParticleConfig::default()));
        buffers.update_instances(&graph);
        buffers.update_camera(&Camera::from_config(&CameraConfig::default(), 1.0));
        buffers
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_pixel_math_does_not_wrap_on_large_surfaces() {
        assert_eq!(pixel_count(70_000, 70_000), 4_900_000_000);
        assert_eq!(pixel_index(5, 69_999, 70_000), 69_999 * 70_000 + 5);
        assert_eq!(pixel_index(3, 2, 16), 35);
    }

    #[test]
    fn test_draw_requires_surface() {
        let mut backend = SoftwareBackend::new();
        let buffers = staged_cube();
        assert!(matches!(backend.draw(&buffers.frame()), Err(RenderError::NoSurface)));
    }

    #[test]
    fn test_renders_object_over_background() {
        let mut backend = SoftwareBackend::new();
        backend.create_surface(ContainerHandle(1), (64, 64)).unwrap();
        let buffers = staged_cube();
        backend.upload_meshes(buffers.meshes()).unwrap();
        backend.draw(&buffers.frame()).unwrap();

        let image = backend.image().unwrap();
        let background = Rgba(Color::from_hex(0xf0f9ff).to_rgba8(1.0));
        assert_eq!(*image.get_pixel(0, 0), background);
        let centre = image.get_pixel(32, 32);
        assert_ne!(*centre, background);
        assert!(centre.0[0] > centre.0[2]);
        assert_eq!(backend.frames_drawn(), 1);
    }

    #[test]
    fn test_resize_and_release() {
        let mut backend = SoftwareBackend::new();
        assert!(backend.resize_surface((10, 10)).is_err());
        backend.create_surface(ContainerHandle(7), (32, 16)).unwrap();
        backend.resize_surface((20, 40)).unwrap();
        assert_eq!(backend.surface_extent(), Some((20, 40)));
        backend.release();
        backend.release();
        assert_eq!(backend.surface_extent(), None);
        assert!(backend.create_surface(ContainerHandle(7), (0, 16)).is_err());
    }

    #[test]
    fn test_snapshot_writes_png() {
        let mut backend = SoftwareBackend::new();
        backend.create_surface(ContainerHandle(2), (16, 16)).unwrap();
        let buffers = staged_cube();
        backend.upload_meshes(buffers.meshes()).unwrap();
        backend.draw(&buffers.frame()).unwrap();

        let path = std::env::temp_dir().join(format!("backdrop_snapshot_{}.png", std::process::id()));
        backend.snapshot(&path).unwrap();
        let loaded = image::open(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.width(), 16);
    }
}
