//! Quadcopter model assembled from a declarative part table
//!
//! Every part is a row of (name, parent, primitive, material, local
//! transform). [`build_parts`] consumes any such table; the drone builder
//! only generates the rows from a handful of geometry constants.

use std::collections::HashMap;

use crate::core::config::DroneConfig;
use crate::foundation::math::{constants::HALF_PI, EulerRotation, RotationOrder, Transform, Vec3};
use crate::scene::primitives::{Primitive, PrimitiveFactory, Renderable, SurfaceMaterial};
use crate::scene::scene_graph::{NodeKey, SceneGraph};
use crate::scene::SceneError;

/// Name of the node whose pose the motion controller drives
pub const DRONE_ROOT: &str = "drone";
/// Signal light toggled as the front beacon
pub const FRONT_BEACON: &str = "light.front.0";
/// Signal light toggled as the rear beacon
pub const BACK_BEACON: &str = "light.rear.0";

const ARM_RADIUS: f32 = 0.04;
const ARM_HEIGHT: f32 = 0.02;
const MOTOR_MOUNT_HEIGHT: f32 = 0.05;
const MOTOR_HEIGHT: f32 = 0.11;
const PROPELLER_HEIGHT: f32 = 0.17;
const GUARD_HEIGHT: f32 = 0.15;
const BLADE_SIZE: (f32, f32, f32) = (0.45, 0.01, 0.05);
const LEG_OFFSETS: [(f32, f32); 4] = [(0.2, 0.25), (-0.2, 0.25), (0.2, -0.25), (-0.2, -0.25)];
const LIGHT_OFFSET: (f32, f32, f32) = (0.15, 0.05, 0.26);

/// Colours of the drone parts
mod palette {
    pub const BODY: u32 = 0x00ff_6b35;
    pub const DARK: u32 = 0x001a_1a2e;
    pub const ARM: u32 = 0x003d_3d3d;
    pub const BLADE: u32 = 0x000e_a5e9;
    pub const LENS: u32 = 0x001e_293b;
    pub const GUARD: u32 = 0x004b_5563;
    pub const LEG: u32 = 0x0037_4151;
    pub const SIGNAL_GREEN: u32 = 0x0022_c55e;
    pub const SIGNAL_RED: u32 = 0x00ef_4444;
}

/// Where a part hangs in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartParent {
    /// Directly under the scene root
    Scene,
    /// Under a part declared earlier in the same table
    Part(String),
}

/// One row of a part table
#[derive(Debug, Clone)]
pub struct PartSpec {
    /// Unique part name
    pub name: String,
    /// Parent part
    pub parent: PartParent,
    /// Geometry and surface; `None` for pure grouping nodes
    pub renderable: Option<Renderable>,
    /// Local transform
    pub transform: Transform,
}

impl PartSpec {
    fn group(name: impl Into<String>, parent: PartParent, transform: Transform) -> Self {
        Self { name: name.into(), parent, renderable: None, transform }
    }

    fn mesh(
        name: impl Into<String>,
        parent: &str,
        primitive: Primitive,
        material: SurfaceMaterial,
        transform: Transform,
    ) -> Self {
        Self {
            name: name.into(),
            parent: PartParent::Part(parent.to_string()),
            renderable: Some(Renderable { primitive, material }),
            transform,
        }
    }
}

/// Instantiate a part table into `graph`, returning the key of every part by name.
///
/// Parents must be declared before their children.
pub fn build_parts(graph: &mut SceneGraph, parts: &[PartSpec]) -> Result<HashMap<String, NodeKey>, SceneError> {
    let mut built = HashMap::with_capacity(parts.len());
    for part in parts {
        if built.contains_key(&part.name) {
            return Err(SceneError::DuplicatePart(part.name.clone()));
        }
        let parent = match &part.parent {
            PartParent::Scene => graph.root(),
            PartParent::Part(name) => *built.get(name).ok_or_else(|| SceneError::UnknownParent {
                part: part.name.clone(),
                parent: name.clone(),
            })?,
        };
        if let Some(renderable) = &part.renderable {
            renderable.primitive.validate()?;
        }
        let key = graph.spawn(part.name.clone(), part.transform, part.renderable, parent)?;
        built.insert(part.name.clone(), key);
    }
    log::debug!("Built {} parts", built.len());
    Ok(built)
}

/// Handles into a built drone
#[derive(Debug, Clone)]
pub struct DroneModel {
    /// Root group driven by the motion controller
    pub root: NodeKey,
    /// Propeller groups in corner order
    pub propellers: [NodeKey; 4],
    /// Blinking front light
    pub front_light: NodeKey,
    /// Blinking rear light
    pub back_light: NodeKey,
    parts: HashMap<String, NodeKey>,
}

impl DroneModel {
    /// Look up a part by name
    pub fn part(&self, name: &str) -> Option<NodeKey> {
        self.parts.get(name).copied()
    }

    /// Number of parts including grouping nodes
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

/// Generates and builds the drone part table
#[derive(Debug, Clone)]
pub struct DroneModelBuilder {
    config: DroneConfig,
}

impl DroneModelBuilder {
    /// Create a builder for the given geometry
    pub fn new(config: DroneConfig) -> Self {
        Self { config }
    }

    /// Motor corners `(x, z)` in the order (+,+), (-,+), (+,-), (-,-)
    pub fn corners(&self) -> [(f32, f32); 4] {
        let d = self.config.motor_distance;
        [(d, d), (-d, d), (d, -d), (-d, -d)]
    }

    /// Arm length and yaw for a motor corner
    ///
    /// The arm is a vertical cylinder tilted 90° about X; the yaw then swings
    /// its axis to point from the body centre to the corner.
    pub fn arm_geometry(&self, corner: (f32, f32)) -> (f32, f32) {
        let (x, z) = corner;
        (x.hypot(z) - self.config.arm_inset, x.atan2(z))
    }

    /// The full part table
    pub fn part_table(&self) -> Vec<PartSpec> {
        let dark = PrimitiveFactory::standard(palette::DARK, 0.8, 0.2);
        let [sx, sy, sz] = self.config.spawn_position;

        let mut parts = vec![
            PartSpec::group(DRONE_ROOT, PartParent::Scene, Transform::from_position(Vec3::new(sx, sy, sz))),
            PartSpec::group("body", PartParent::Part(DRONE_ROOT.into()), Transform::identity()),
            PartSpec::mesh(
                "body.shell",
                "body",
                PrimitiveFactory::cuboid(0.5, 0.2, 0.5),
                PrimitiveFactory::standard(palette::BODY, 0.7, 0.3),
                at(0.0, 0.05, 0.0),
            ),
            PartSpec::mesh("body.top_cover", "body", PrimitiveFactory::cuboid(0.4, 0.08, 0.4), dark, at(0.0, 0.19, 0.0)),
            PartSpec::mesh("body.bottom_plate", "body", PrimitiveFactory::cuboid(0.45, 0.05, 0.45), dark, at(0.0, -0.07, 0.0)),
            PartSpec::group("gimbal", PartParent::Part(DRONE_ROOT.into()), Transform::identity()),
            PartSpec::mesh("gimbal.mount", "gimbal", PrimitiveFactory::cylinder(0.06, 0.08, 0.08, 16), dark, at(0.0, -0.15, 0.0)),
            PartSpec::mesh(
                "gimbal.lens",
                "gimbal",
                PrimitiveFactory::sphere_with_segments(0.08, 16, 16),
                PrimitiveFactory::standard(palette::LENS, 0.95, 0.05),
                at(0.0, -0.2, 0.05),
            ),
        ];

        let (lx, ly, lz) = LIGHT_OFFSET;
        for (side, z, color) in [("front", lz, palette::SIGNAL_GREEN), ("rear", -lz, palette::SIGNAL_RED)] {
            for (i, x) in [lx, -lx].into_iter().enumerate() {
                parts.push(PartSpec::mesh(
                    format!("light.{side}.{i}"),
                    DRONE_ROOT,
                    PrimitiveFactory::sphere(0.03),
                    PrimitiveFactory::unlit(color),
                    at(x, ly, z),
                ));
            }
        }

        let blade = PrimitiveFactory::translucent(palette::BLADE, 0.6);
        let (bw, bh, bd) = BLADE_SIZE;
        for (i, corner) in self.corners().into_iter().enumerate() {
            let (x, z) = corner;
            let (length, yaw) = self.arm_geometry(corner);
            let propeller = format!("propeller.{i}");

            parts.push(PartSpec::mesh(
                format!("arm.{i}"),
                DRONE_ROOT,
                PrimitiveFactory::cylinder(ARM_RADIUS, ARM_RADIUS, length, 8),
                PrimitiveFactory::standard(palette::ARM, 0.6, 0.4),
                Transform::from_position_rotation(
                    Vec3::new(x * 0.5, ARM_HEIGHT, z * 0.5),
                    EulerRotation::with_order(HALF_PI, yaw, 0.0, RotationOrder::Yxz),
                ),
            ));
            parts.push(PartSpec::mesh(
                format!("motor_mount.{i}"),
                DRONE_ROOT,
                PrimitiveFactory::cylinder(0.1, 0.12, 0.05, 16),
                dark,
                at(x, MOTOR_MOUNT_HEIGHT, z),
            ));
            parts.push(PartSpec::mesh(
                format!("motor.{i}"),
                DRONE_ROOT,
                PrimitiveFactory::cylinder(0.07, 0.07, 0.08, 16),
                dark,
                at(x, MOTOR_HEIGHT, z),
            ));
            parts.push(PartSpec::group(
                propeller.clone(),
                PartParent::Part(DRONE_ROOT.into()),
                at(x, PROPELLER_HEIGHT, z),
            ));
            parts.push(PartSpec::mesh(
                format!("{propeller}.blade_a"),
                &propeller,
                PrimitiveFactory::cuboid(bw, bh, bd),
                blade,
                Transform::identity(),
            ));
            parts.push(PartSpec::mesh(
                format!("{propeller}.blade_b"),
                &propeller,
                PrimitiveFactory::cuboid(bw, bh, bd),
                blade,
                Transform::from_position_rotation(Vec3::zeros(), EulerRotation::new(0.0, HALF_PI, 0.0)),
            ));
            parts.push(PartSpec::mesh(
                format!("guard.{i}"),
                DRONE_ROOT,
                PrimitiveFactory::torus(0.26, 0.01, 8, 24),
                PrimitiveFactory::standard(palette::GUARD, 0.5, 0.5),
                Transform::from_position_rotation(Vec3::new(x, GUARD_HEIGHT, z), EulerRotation::new(HALF_PI, 0.0, 0.0)),
            ));
        }

        let leg = PrimitiveFactory::standard(palette::LEG, 0.0, 1.0);
        for (i, (x, z)) in LEG_OFFSETS.into_iter().enumerate() {
            parts.push(PartSpec::mesh(
                format!("leg.{i}"),
                DRONE_ROOT,
                PrimitiveFactory::cylinder(0.02, 0.02, 0.15, 8),
                leg,
                at(x, -0.17, z),
            ));
            parts.push(PartSpec::mesh(
                format!("foot.{i}"),
                DRONE_ROOT,
                PrimitiveFactory::sphere_with_segments(0.03, 8, 8),
                leg,
                at(x, -0.25, z),
            ));
        }

        parts
    }

    /// Build the drone under the scene root
    pub fn build(&self, graph: &mut SceneGraph) -> Result<DroneModel, SceneError> {
        let parts = build_parts(graph, &self.part_table())?;
        let lookup = |name: &str| parts.get(name).copied().ok_or_else(|| SceneError::MissingPart(name.to_string()));

        let model = DroneModel {
            root: lookup(DRONE_ROOT)?,
            propellers: [
                lookup("propeller.0")?,
                lookup("propeller.1")?,
                lookup("propeller.2")?,
                lookup("propeller.3")?,
            ],
            front_light: lookup(FRONT_BEACON)?,
            back_light: lookup(BACK_BEACON)?,
            parts,
        };
        log::info!("Drone model built with {} parts", model.part_count());
        Ok(model)
    }
}

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    fn build_default() -> (SceneGraph, DroneModel) {
        let mut graph = SceneGraph::new();
        let model = DroneModelBuilder::new(DroneConfig::default()).build(&mut graph).unwrap();
        (graph, model)
    }

    #[test]
    fn test_arm_geometry_matches_corner() {
        let builder = DroneModelBuilder::new(DroneConfig::default());
        let (length, yaw) = builder.arm_geometry((0.7, 0.7));
        assert_relative_eq!(length, 0.7_f32.hypot(0.7) - 0.2, epsilon = 1e-6);
        assert_relative_eq!(yaw, std::f32::consts::FRAC_PI_4, epsilon = 1e-6);

        let (_, yaw) = builder.arm_geometry((-0.7, -0.7));
        assert_relative_eq!(yaw, -3.0 * std::f32::consts::FRAC_PI_4, epsilon = 1e-6);
    }

    #[test]
    fn test_part_counts() {
        let (graph, model) = build_default();
        // drone, body(4), gimbal(3), 4 lights, 4 x (arm, mount, motor, prop group, 2 blades, guard), 4 x (leg, foot)
        let expected = 1 + 4 + 3 + 4 + 4 * 7 + 4 * 2;
        assert_eq!(model.part_count(), expected);
        assert_eq!(graph.len(), expected + 1);

        let drawables = graph.traverse().filter(|v| v.renderable().is_some()).count();
        // Everything except drone, body, gimbal and the four propeller groups
        assert_eq!(drawables, expected - 3 - 4);
    }

    #[test]
    fn test_all_parts_hang_under_drone_root() {
        let (graph, model) = build_default();
        let root_children = graph.node(graph.root()).unwrap().children();
        assert_eq!(root_children, &[model.root]);
        assert_eq!(graph.node(model.front_light).unwrap().parent(), Some(model.root));
        for propeller in model.propellers {
            assert_eq!(graph.node(propeller).unwrap().children().len(), 2);
        }
    }

    #[test]
    fn test_arm_points_from_centre_to_motor() {
        let (graph, model) = build_default();
        let builder = DroneModelBuilder::new(DroneConfig::default());
        for (i, (x, z)) in builder.corners().into_iter().enumerate() {
            let arm = model.part(&format!("arm.{i}")).unwrap();
            let (length, _) = builder.arm_geometry((x, z));
            let local = graph.node(arm).unwrap().transform.to_matrix();
            // The outer end of the cylinder axis lands on the corner direction
            let tip = local.transform_point(&Point3::new(0.0, length * 0.5, 0.0));
            let direction = Vec3::new(x, 0.0, z).normalize();
            let reach = Vec3::new(tip.x, 0.0, tip.z);
            assert_relative_eq!(reach.normalize(), direction, epsilon = 1e-4);
            assert_relative_eq!(reach.norm(), Vec3::new(x, 0.0, z).norm() * 0.5 + length * 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_beacons_are_green_front_and_red_rear() {
        let (graph, model) = build_default();
        let front = graph.node(model.front_light).unwrap();
        let back = graph.node(model.back_light).unwrap();
        assert!(front.transform.position.z > 0.0);
        assert!(back.transform.position.z < 0.0);
        assert!(front.renderable().unwrap().material.color.g > 0.5);
        assert!(back.renderable().unwrap().material.color.r > 0.5);
    }

    #[test]
    fn test_table_errors() {
        let mut graph = SceneGraph::new();
        let orphan = vec![PartSpec::group("a", PartParent::Part("missing".into()), Transform::identity())];
        assert!(matches!(build_parts(&mut graph, &orphan), Err(SceneError::UnknownParent { .. })));

        let duplicate = vec![
            PartSpec::group("a", PartParent::Scene, Transform::identity()),
            PartSpec::group("a", PartParent::Scene, Transform::identity()),
        ];
        assert_eq!(build_parts(&mut graph, &duplicate), Err(SceneError::DuplicatePart("a".into())));

        let degenerate = vec![
            PartSpec::group("a", PartParent::Scene, Transform::identity()),
            PartSpec::mesh(
                "flat",
                "a",
                PrimitiveFactory::cuboid(0.0, 1.0, 1.0),
                PrimitiveFactory::unlit(0xffffff),
                Transform::identity(),
            ),
        ];
        let mut graph = SceneGraph::new();
        assert!(matches!(build_parts(&mut graph, &degenerate), Err(SceneError::InvalidPrimitive(_))));
    }
}
