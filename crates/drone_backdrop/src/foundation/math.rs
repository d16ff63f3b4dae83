//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the local transform used by scene nodes.

pub use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Order in which Euler angles are composed into a rotation matrix.
///
/// `Xyz` yields `Rx * Ry * Rz`, `Yxz` yields `Ry * Rx * Rz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOrder {
    /// X, then Y, then Z (the default)
    #[default]
    Xyz,
    /// Y, then X, then Z (used to aim tilted cylinders)
    Yxz,
}

/// Euler rotation in radians with an explicit composition order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerRotation {
    /// Rotation about X (pitch)
    pub x: f32,
    /// Rotation about Y (yaw)
    pub y: f32,
    /// Rotation about Z (roll)
    pub z: f32,
    /// Composition order
    pub order: RotationOrder,
}

impl EulerRotation {
    /// Create an XYZ-ordered rotation
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, order: RotationOrder::Xyz }
    }

    /// Create a rotation with an explicit order
    pub const fn with_order(x: f32, y: f32, z: f32, order: RotationOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Convert to a unit quaternion
    pub fn to_quat(&self) -> Quat {
        let rx = Quat::from_axis_angle(&Vec3::x_axis(), self.x);
        let ry = Quat::from_axis_angle(&Vec3::y_axis(), self.y);
        let rz = Quat::from_axis_angle(&Vec3::z_axis(), self.z);
        match self.order {
            RotationOrder::Xyz => rx * ry * rz,
            RotationOrder::Yxz => ry * rx * rz,
        }
    }
}

/// Local transform of a scene node: position, Euler rotation and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: EulerRotation,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: EulerRotation::default(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: EulerRotation) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (translate * rotate * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_quat().to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

/// Extension trait for Mat4 with projection helpers
pub trait Mat4Ext {
    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Right-handed perspective projection (OpenGL clip conventions)
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Extract the upper 3x3 linear part
    fn linear_part(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn linear_part(&self) -> Mat3 {
        self.fixed_view::<3, 3>(0, 0).into_owned()
    }
}
