//! Transform hierarchy stored in a slot arena
//!
//! Nodes live in a flat [`SlotMap`]; a parent keeps the ordered keys of its
//! children and each child records its single parent. The root is owned by
//! the graph itself and can never be attached elsewhere, so the structure
//! stays a tree.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Transform};
use crate::scene::primitives::Renderable;
use crate::scene::SceneError;

new_key_type! {
    /// Handle to a node in a [`SceneGraph`]
    pub struct NodeKey;
}

/// A node of the hierarchy with its local transform
#[derive(Debug, Clone)]
pub struct TransformNode {
    /// Human readable name, unique within a built model
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Hidden nodes are skipped together with their subtree
    pub visible: bool,
    renderable: Option<Renderable>,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl TransformNode {
    fn new(name: impl Into<String>, transform: Transform, renderable: Option<Renderable>) -> Self {
        Self {
            name: name.into(),
            transform,
            visible: true,
            renderable,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Attached primitive, if any
    pub fn renderable(&self) -> Option<&Renderable> {
        self.renderable.as_ref()
    }

    /// Owning parent; `None` for the root and for detached nodes
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// One step of a depth-first walk
#[derive(Debug, Clone, Copy)]
pub struct SceneVisit<'a> {
    /// Visited node
    pub key: NodeKey,
    /// Node data
    pub node: &'a TransformNode,
    /// Composed root-to-node transform
    pub world: Mat4,
}

impl<'a> SceneVisit<'a> {
    /// Primitive attached to the visited node
    pub fn renderable(&self) -> Option<&'a Renderable> {
        self.node.renderable()
    }
}

/// Lazy depth-first iterator over the visible part of a [`SceneGraph`]
pub struct Traversal<'a> {
    graph: &'a SceneGraph,
    stack: Vec<(NodeKey, Mat4)>,
}

impl<'a> Iterator for Traversal<'a> {
    type Item = SceneVisit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;
        while let Some((key, parent_world)) = self.stack.pop() {
            let Some(node) = graph.nodes.get(key) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.to_matrix();
            // Reverse so the first child is visited first
            self.stack.extend(node.children.iter().rev().map(|child| (*child, world)));
            return Some(SceneVisit { key, node, world });
        }
        None
    }
}

/// Arena-backed scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, TransformNode>,
    root: NodeKey,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root node
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TransformNode::new("scene", Transform::identity(), None));
        Self { nodes, root }
    }

    /// The root node, owned by the graph
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of nodes including the root and detached nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds only the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Create a detached group node
    pub fn create_node(&mut self, name: impl Into<String>, transform: Transform) -> NodeKey {
        self.nodes.insert(TransformNode::new(name, transform, None))
    }

    /// Create a node and attach it under `parent` in one step
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        renderable: Option<Renderable>,
        parent: NodeKey,
    ) -> Result<NodeKey, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let key = self.nodes.insert(TransformNode::new(name, transform, renderable));
        self.attach(key, parent)?;
        Ok(key)
    }

    /// Insert `child` as the last child of `parent`.
    ///
    /// Fails if the child already has an owner, is the root, or is an
    /// ancestor of `parent`.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) -> Result<(), SceneError> {
        let child_node = self.nodes.get(child).ok_or(SceneError::UnknownNode(child))?;
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if child == self.root || child_node.parent.is_some() {
            return Err(SceneError::AlreadyOwned(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { child, parent });
        }

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    /// Remove `child` from its parent, leaving it detached but alive
    pub fn detach(&mut self, child: NodeKey) -> Result<(), SceneError> {
        let parent = self
            .nodes
            .get_mut(child)
            .ok_or(SceneError::UnknownNode(child))?
            .parent
            .take();
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent_node.children.retain(|k| *k != child);
        }
        Ok(())
    }

    /// Detach `key` and free it together with all of its descendants.
    ///
    /// Returns the number of nodes released. The root cannot be removed.
    pub fn remove_subtree(&mut self, key: NodeKey) -> Result<usize, SceneError> {
        if key == self.root {
            return Err(SceneError::AlreadyOwned(key));
        }
        self.detach(key)?;
        let mut pending = vec![key];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                pending.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Free every node except the root
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|key, _| key == root);
        if let Some(root_node) = self.nodes.get_mut(root) {
            root_node.children.clear();
        }
    }

    /// Access a node
    pub fn node(&self, key: NodeKey) -> Option<&TransformNode> {
        self.nodes.get(key)
    }

    /// Mutably access a node
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut TransformNode> {
        self.nodes.get_mut(key)
    }

    /// Replace a node's local transform
    pub fn set_transform(&mut self, key: NodeKey, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(key).ok_or(SceneError::UnknownNode(key))?.transform = transform;
        Ok(())
    }

    /// Show or hide a node and its subtree
    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<(), SceneError> {
        self.node_mut(key).ok_or(SceneError::UnknownNode(key))?.visible = visible;
        Ok(())
    }

    /// Compose local transforms from the top of the node's chain down to the node
    pub fn world_transform(&self, key: NodeKey) -> Result<Mat4, SceneError> {
        let mut world = Mat4::identity();
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.nodes.get(k).ok_or(SceneError::UnknownNode(k))?;
            world = node.transform.to_matrix() * world;
            current = node.parent;
        }
        Ok(world)
    }

    /// Depth-first walk from the root over visible nodes
    ///
    /// Each call starts a fresh walk; nodes not reachable from the root are
    /// never yielded.
    pub fn traverse(&self) -> Traversal<'_> {
        Traversal {
            graph: self,
            stack: vec![(self.root, Mat4::identity())],
        }
    }

    /// Find a node reachable from the root by name
    pub fn find(&self, name: &str) -> Option<NodeKey> {
        self.traverse().find(|visit| visit.node.name == name).map(|visit| visit.key)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(|node| node.parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::HALF_PI, EulerRotation, Point3, Vec3};
    use crate::scene::primitives::PrimitiveFactory;
    use approx::assert_relative_eq;

    fn unit_box() -> Renderable {
        Renderable {
            primitive: PrimitiveFactory::cuboid(1.0, 1.0, 1.0),
            material: PrimitiveFactory::standard(0xffffff, 0.0, 1.0),
        }
    }

    #[test]
    fn test_attach_rejects_second_owner() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a", Transform::identity());
        let b = graph.create_node("b", Transform::identity());
        let child = graph.create_node("child", Transform::identity());

        graph.attach(a, graph.root()).unwrap();
        graph.attach(b, graph.root()).unwrap();
        graph.attach(child, a).unwrap();

        assert_eq!(graph.attach(child, b), Err(SceneError::AlreadyOwned(child)));
        assert_eq!(graph.node(child).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_attach_rejects_cycles_and_root() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a", Transform::identity());
        let b = graph.create_node("b", Transform::identity());
        graph.attach(b, a).unwrap();

        assert_eq!(graph.attach(a, b), Err(SceneError::Cycle { child: a, parent: b }));
        assert_eq!(graph.attach(a, a), Err(SceneError::Cycle { child: a, parent: a }));
        assert_eq!(graph.attach(graph.root(), a), Err(SceneError::AlreadyOwned(graph.root())));
    }

    #[test]
    fn test_world_transform_composes_parent_chain() {
        let mut graph = SceneGraph::new();
        let parent = graph
            .spawn(
                "parent",
                Transform::from_position_rotation(Vec3::new(1.0, 0.0, 0.0), EulerRotation::new(0.0, HALF_PI, 0.0)),
                None,
                graph.root(),
            )
            .unwrap();
        let child = graph
            .spawn("child", Transform::from_position(Vec3::new(0.0, 0.0, 1.0)), None, parent)
            .unwrap();

        let world = graph.world_transform(child).unwrap();
        let origin = world.transform_point(&Point3::origin());
        // +Z rotated 90° about Y becomes +X, then offset by the parent
        assert_relative_eq!(origin, Point3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_traverse_is_depth_first_and_restartable() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a", Transform::identity(), None, graph.root()).unwrap();
        graph.spawn("a1", Transform::identity(), Some(unit_box()), a).unwrap();
        graph.spawn("a2", Transform::identity(), None, a).unwrap();
        graph.spawn("b", Transform::identity(), Some(unit_box()), graph.root()).unwrap();

        let names: Vec<_> = graph.traverse().map(|v| v.node.name.clone()).collect();
        assert_eq!(names, ["scene", "a", "a1", "a2", "b"]);

        let again: Vec<_> = graph.traverse().map(|v| v.node.name.clone()).collect();
        assert_eq!(names, again);

        let drawable = graph.traverse().filter(|v| v.renderable().is_some()).count();
        assert_eq!(drawable, 2);
    }

    #[test]
    fn test_traverse_skips_hidden_subtrees_and_detached_nodes() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a", Transform::identity(), None, graph.root()).unwrap();
        graph.spawn("a1", Transform::identity(), None, a).unwrap();
        graph.create_node("orphan", Transform::identity());
        graph.set_visible(a, false).unwrap();

        let names: Vec<_> = graph.traverse().map(|v| v.node.name.clone()).collect();
        assert_eq!(names, ["scene"]);
        assert!(graph.find("orphan").is_none());
    }

    #[test]
    fn test_remove_subtree_frees_descendants() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a", Transform::identity(), None, graph.root()).unwrap();
        let a1 = graph.spawn("a1", Transform::identity(), None, a).unwrap();
        graph.spawn("a1x", Transform::identity(), None, a1).unwrap();

        assert_eq!(graph.remove_subtree(a), Ok(3));
        assert_eq!(graph.len(), 1);
        assert!(graph.node(a1).is_none());
        assert!(graph.node(graph.root()).unwrap().children().is_empty());
    }

    #[test]
    fn test_detach_allows_reparenting() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a", Transform::identity(), None, graph.root()).unwrap();
        let b = graph.spawn("b", Transform::identity(), None, graph.root()).unwrap();
        let c = graph.spawn("c", Transform::identity(), None, a).unwrap();

        graph.detach(c).unwrap();
        graph.attach(c, b).unwrap();
        assert_eq!(graph.node(c).unwrap().parent(), Some(b));
        assert!(graph.node(a).unwrap().children().is_empty());
    }

    #[test]
    fn test_clear_keeps_root() {
        let mut graph = SceneGraph::new();
        graph.spawn("a", Transform::identity(), None, graph.root()).unwrap();
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.traverse().count(), 1);
    }
}
