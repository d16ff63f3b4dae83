//! Geometric primitives and surface descriptors
//!
//! Shapes follow the usual conventions of real-time engines: every primitive
//! is centred on its local origin, cylinders run along +Y and tori lie in
//! the XY plane around +Z.

use crate::foundation::math::{constants::PI, utils, Vec3};
use crate::scene::SceneError;

/// Spacing used when sampling primitive surfaces for point rendering
const SAMPLE_SPACING: f32 = 0.02;

/// Reusable geometric primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box
    Cuboid {
        /// Size along X
        width: f32,
        /// Size along Y
        height: f32,
        /// Size along Z
        depth: f32,
    },
    /// Cylinder or truncated cone along Y
    Cylinder {
        /// Radius at +height/2
        radius_top: f32,
        /// Radius at -height/2
        radius_bottom: f32,
        /// Length along Y
        height: f32,
        /// Segments around the axis
        radial_segments: u32,
    },
    /// UV sphere
    Sphere {
        /// Radius
        radius: f32,
        /// Segments around Y
        width_segments: u32,
        /// Segments from pole to pole
        height_segments: u32,
    },
    /// Ring torus in the XY plane
    Torus {
        /// Distance from centre to tube centre
        radius: f32,
        /// Tube radius
        tube: f32,
        /// Segments around the tube
        radial_segments: u32,
        /// Segments around the ring
        tubular_segments: u32,
    },
}

/// A point on a primitive surface with its outward normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Local-space position
    pub position: Vec3,
    /// Local-space unit normal
    pub normal: Vec3,
}

impl SurfaceSample {
    fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal: normal.try_normalize(1e-6).unwrap_or_else(Vec3::y) }
    }
}

fn steps_for(extent: f32, minimum: usize) -> usize {
    ((extent / SAMPLE_SPACING).ceil() as usize).clamp(minimum, 48)
}

impl Primitive {
    /// Short name of the primitive kind
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Cuboid { .. } => "cuboid",
            Self::Cylinder { .. } => "cylinder",
            Self::Sphere { .. } => "sphere",
            Self::Torus { .. } => "torus",
        }
    }

    /// Check that all dimensions are finite and positive
    pub fn validate(&self) -> Result<(), SceneError> {
        let dims = match self {
            Self::Cuboid { width, height, depth } => vec![*width, *height, *depth],
            Self::Cylinder { radius_top, radius_bottom, height, .. } => {
                if *radius_top < 0.0 || *radius_bottom < 0.0 || *radius_top + *radius_bottom <= 0.0 {
                    return Err(SceneError::InvalidPrimitive(format!("{self:?}")));
                }
                vec![*height]
            }
            Self::Sphere { radius, .. } => vec![*radius],
            Self::Torus { radius, tube, .. } => vec![*radius, *tube],
        };
        if dims.iter().all(|d| d.is_finite() && *d > 0.0) {
            Ok(())
        } else {
            Err(SceneError::InvalidPrimitive(format!("{self:?}")))
        }
    }

    /// Radius of a sphere around the local origin enclosing the primitive
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Cuboid { width, height, depth } => {
                Vec3::new(width, height, depth).norm() * 0.5
            }
            Self::Cylinder { radius_top, radius_bottom, height, .. } => {
                let radius = radius_top.max(radius_bottom);
                (radius * radius + height * height * 0.25).sqrt()
            }
            Self::Sphere { radius, .. } => radius,
            Self::Torus { radius, tube, .. } => radius + tube,
        }
    }

    /// Sample the surface into points with normals, for point-based rasterisation
    pub fn surface_samples(&self) -> Vec<SurfaceSample> {
        match *self {
            Self::Cuboid { width, height, depth } => cuboid_samples(width, height, depth),
            Self::Cylinder { radius_top, radius_bottom, height, radial_segments } => {
                cylinder_samples(radius_top, radius_bottom, height, radial_segments)
            }
            Self::Sphere { radius, width_segments, height_segments } => {
                sphere_samples(radius, width_segments, height_segments)
            }
            Self::Torus { radius, tube, radial_segments, tubular_segments } => {
                torus_samples(radius, tube, radial_segments, tubular_segments)
            }
        }
    }
}

fn cuboid_samples(width: f32, height: f32, depth: f32) -> Vec<SurfaceSample> {
    let half = Vec3::new(width, height, depth) * 0.5;
    let mut samples = Vec::new();
    // (normal axis, u axis, v axis)
    for (axis, u_axis, v_axis) in [(0usize, 1usize, 2usize), (1, 0, 2), (2, 0, 1)] {
        let u_steps = steps_for(half[u_axis] * 2.0, 2);
        let v_steps = steps_for(half[v_axis] * 2.0, 2);
        for sign in [-1.0_f32, 1.0] {
            let mut normal = Vec3::zeros();
            normal[axis] = sign;
            for i in 0..=u_steps {
                for j in 0..=v_steps {
                    let mut position = Vec3::zeros();
                    position[axis] = sign * half[axis];
                    position[u_axis] = utils::lerp(-half[u_axis], half[u_axis], i as f32 / u_steps as f32);
                    position[v_axis] = utils::lerp(-half[v_axis], half[v_axis], j as f32 / v_steps as f32);
                    samples.push(SurfaceSample::new(position, normal));
                }
            }
        }
    }
    samples
}

fn cylinder_samples(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Vec<SurfaceSample> {
    let around = (radial_segments as usize).max(3) * 2;
    let rings = steps_for(height, 1);
    let slope = (radius_bottom - radius_top) / height;
    let mut samples = Vec::new();

    for ring in 0..=rings {
        let t = ring as f32 / rings as f32;
        let y = utils::lerp(-height * 0.5, height * 0.5, t);
        let radius = utils::lerp(radius_bottom, radius_top, t);
        for i in 0..around {
            let theta = i as f32 / around as f32 * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();
            samples.push(SurfaceSample::new(
                Vec3::new(radius * sin, y, radius * cos),
                Vec3::new(sin, slope, cos),
            ));
        }
    }

    for (y, radius, normal) in [
        (height * 0.5, radius_top, Vec3::y()),
        (-height * 0.5, radius_bottom, -Vec3::y()),
    ] {
        let cap_rings = steps_for(radius, 1);
        for ring in 1..=cap_rings {
            let r = radius * ring as f32 / cap_rings as f32;
            for i in 0..around {
                let theta = i as f32 / around as f32 * 2.0 * PI;
                samples.push(SurfaceSample::new(Vec3::new(r * theta.sin(), y, r * theta.cos()), normal));
            }
        }
        samples.push(SurfaceSample::new(Vec3::new(0.0, y, 0.0), normal));
    }
    samples
}

fn sphere_samples(radius: f32, width_segments: u32, height_segments: u32) -> Vec<SurfaceSample> {
    let around = (width_segments as usize).max(3) * 2;
    let rings = (height_segments as usize).max(2) * 2;
    let mut samples = Vec::with_capacity((rings + 1) * around);
    for ring in 0..=rings {
        let phi = ring as f32 / rings as f32 * PI;
        for i in 0..around {
            let theta = i as f32 / around as f32 * 2.0 * PI;
            let direction = Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
            samples.push(SurfaceSample::new(direction * radius, direction));
        }
    }
    samples
}

fn torus_samples(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Vec<SurfaceSample> {
    let around_tube = (radial_segments as usize).max(3);
    let around_ring = (tubular_segments as usize).max(3) * 2;
    let mut samples = Vec::with_capacity(around_tube * around_ring);
    for i in 0..around_ring {
        let u = i as f32 / around_ring as f32 * 2.0 * PI;
        let centre = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
        for j in 0..around_tube {
            let v = j as f32 / around_tube as f32 * 2.0 * PI;
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            samples.push(SurfaceSample::new(position, position - centre));
        }
    }
    samples
}

/// Linear RGB colour with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Color {
    /// White
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };

    /// Create a colour from a `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self { r: channel(16), g: channel(8), b: channel(0) }
    }

    /// Multiply every channel by `factor`, clamping to `[0, 1]`
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            r: (self.r * factor).clamp(0.0, 1.0),
            g: (self.g * factor).clamp(0.0, 1.0),
            b: (self.b * factor).clamp(0.0, 1.0),
        }
    }

    /// Channels as `[r, g, b, alpha]`
    pub const fn to_array(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }

    /// Convert to 8-bit RGBA
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba8(self, alpha: f32) -> [u8; 4] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b), quantize(alpha)]
    }
}

/// How a surface reacts to scene lights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Ambient plus directional diffuse
    Lit,
    /// Flat colour, ignores lights
    Unlit,
}

/// Shaded-surface descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    /// Base colour
    pub color: Color,
    /// Metalness in `[0, 1]`
    pub metalness: f32,
    /// Roughness in `[0, 1]`
    pub roughness: f32,
    /// Opacity in `[0, 1]`; below 1 the surface is blended
    pub opacity: f32,
    /// Lighting model
    pub shading: Shading,
}

impl SurfaceMaterial {
    /// Whether the surface needs blending
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// A primitive paired with the material it is drawn with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    /// Geometry
    pub primitive: Primitive,
    /// Surface
    pub material: SurfaceMaterial,
}

/// Constructors for primitives and materials
pub struct PrimitiveFactory;

impl PrimitiveFactory {
    /// Box of the given size
    pub const fn cuboid(width: f32, height: f32, depth: f32) -> Primitive {
        Primitive::Cuboid { width, height, depth }
    }

    /// Cylinder (or cone frustum) along Y
    pub const fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Primitive {
        Primitive::Cylinder { radius_top, radius_bottom, height, radial_segments }
    }

    /// Sphere with the default tessellation
    pub const fn sphere(radius: f32) -> Primitive {
        Self::sphere_with_segments(radius, 32, 16)
    }

    /// Sphere with explicit tessellation
    pub const fn sphere_with_segments(radius: f32, width_segments: u32, height_segments: u32) -> Primitive {
        Primitive::Sphere { radius, width_segments, height_segments }
    }

    /// Torus in the XY plane
    pub const fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Primitive {
        Primitive::Torus { radius, tube, radial_segments, tubular_segments }
    }

    /// Opaque physically-described surface
    pub fn standard(hex: u32, metalness: f32, roughness: f32) -> SurfaceMaterial {
        SurfaceMaterial {
            color: Color::from_hex(hex),
            metalness,
            roughness,
            opacity: 1.0,
            shading: Shading::Lit,
        }
    }

    /// Lit surface blended at `opacity`
    pub fn translucent(hex: u32, opacity: f32) -> SurfaceMaterial {
        SurfaceMaterial {
            opacity: opacity.clamp(0.0, 1.0),
            ..Self::standard(hex, 0.0, 1.0)
        }
    }

    /// Flat emissive-looking surface
    pub fn unlit(hex: u32) -> SurfaceMaterial {
        SurfaceMaterial {
            shading: Shading::Unlit,
            ..Self::standard(hex, 0.0, 1.0)
        }
    }
}
