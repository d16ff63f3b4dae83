//! Scene construction: primitives, the transform hierarchy and the drone model

pub mod primitives;
pub mod scene_graph;
pub mod drone;

pub use drone::{DroneModel, DroneModelBuilder, PartParent, PartSpec};
pub use primitives::{Color, Primitive, PrimitiveFactory, Renderable, Shading, SurfaceMaterial, SurfaceSample};
pub use scene_graph::{NodeKey, SceneGraph, SceneVisit, TransformNode, Traversal};

use thiserror::Error;

/// Scene construction and hierarchy errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The key does not refer to a live node
    #[error("Unknown scene node {0:?}")]
    UnknownNode(NodeKey),

    /// The child already has a parent (or is the scene root)
    #[error("Node {0:?} already has an owner")]
    AlreadyOwned(NodeKey),

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Node being attached
        child: NodeKey,
        /// Intended parent
        parent: NodeKey,
    },

    /// A primitive has non-positive or non-finite dimensions
    #[error("Invalid primitive: {0}")]
    InvalidPrimitive(String),

    /// A part table refers to a parent that was not declared before it
    #[error("Part '{part}' refers to unknown parent '{parent}'")]
    UnknownParent {
        /// Part being built
        part: String,
        /// Missing parent name
        parent: String,
    },

    /// Two parts in a table share a name
    #[error("Duplicate part name '{0}'")]
    DuplicatePart(String),

    /// A part the drone model relies on is missing from the table
    #[error("Missing required part '{0}'")]
    MissingPart(String),
}
