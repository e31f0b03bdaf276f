use glam::{Quat, Vec3};
use slotmap::{SecondaryMap, SlotMap};

use crate::animation::values::MorphWeights;
use crate::errors::{AnimatorError, Result};
use crate::scene::mesh::Mesh;
use crate::scene::node::Node;
use crate::scene::skeleton::Skeleton;
use crate::scene::transform_system;
use crate::scene::{MeshKey, NodeHandle, SkeletonKey};

/// Scene graph
///
/// Pure data: the node arena, the root list in load order, and the mesh and
/// skin pools that nodes refer to by key.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    pub meshes: SlotMap<MeshKey, Mesh>,
    pub skins: SlotMap<SkeletonKey, Skeleton>,
}

/// Snapshot of every node's TRS and morph weights.
#[derive(Debug, Clone, Default)]
pub struct RestPose {
    entries: SecondaryMap<NodeHandle, (Vec3, Quat, Vec3, MorphWeights)>,
}

impl RestPose {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a node.
    pub fn build_node(&'_ mut self, name: &str) -> NodeBuilder<'_> {
        NodeBuilder::new(self, name)
    }

    /// Inserts a node without placing it in the hierarchy.
    pub fn create_node(&mut self, node: Node) -> NodeHandle {
        self.nodes.insert(node)
    }

    /// Inserts a node as a new root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Makes `child` the last child of `parent`.
    ///
    /// Nodes are never reparented: a child that already has a parent is
    /// rejected, as is any link that would make a node its own ancestor.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> Result<()> {
        let Some(child_node) = self.nodes.get(child) else {
            return Err(AnimatorError::InvalidHandle("attach: child node not found".to_string()));
        };
        if !self.nodes.contains_key(parent) {
            return Err(AnimatorError::InvalidHandle(format!(
                "attach: parent of '{}' not found",
                child_node.name
            )));
        }
        if child == parent {
            return Err(AnimatorError::HierarchyCycle(format!(
                "node '{}' cannot be its own parent",
                child_node.name
            )));
        }
        if child_node.parent.is_some() {
            return Err(AnimatorError::AlreadyParented(child_node.name.clone()));
        }
        if self.is_ancestor(child, parent) {
            return Err(AnimatorError::HierarchyCycle(format!(
                "node '{}' is an ancestor of its would-be parent",
                child_node.name
            )));
        }

        if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
        Ok(())
    }

    /// Whether `ancestor` lies on the parent chain of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.nodes.get(node).and_then(Node::parent);
        // The chain can be no longer than the node count
        for _ in 0..self.nodes.len() {
            match current {
                Some(h) if h == ancestor => return true,
                Some(h) => current = self.nodes.get(h).and_then(Node::parent),
                None => return false,
            }
        }
        false
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// First node named `name`, in arena order.
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find_map(|(handle, node)| (node.name == name).then_some(handle))
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshKey {
        self.meshes.insert(mesh)
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skins.insert(skeleton)
    }

    /// Attaches `mesh` to `node`. The node's morph weights are resized to the
    /// mesh's target count.
    pub fn set_mesh(&mut self, node: NodeHandle, mesh: MeshKey) -> Result<()> {
        let target_count = self
            .meshes
            .get(mesh)
            .map(Mesh::morph_target_count)
            .ok_or_else(|| AnimatorError::InvalidHandle("set_mesh: mesh not found".to_string()))?;
        let node = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| AnimatorError::InvalidHandle("set_mesh: node not found".to_string()))?;
        node.mesh = Some(mesh);
        node.morph_weights.resize(target_count);
        Ok(())
    }

    pub fn bind_skeleton(&mut self, node: NodeHandle, skeleton: SkeletonKey) -> Result<()> {
        if !self.skins.contains_key(skeleton) {
            return Err(AnimatorError::InvalidHandle(
                "bind_skeleton: skeleton not found".to_string(),
            ));
        }
        let node = self.nodes.get_mut(node).ok_or_else(|| {
            AnimatorError::InvalidHandle("bind_skeleton: node not found".to_string())
        })?;
        node.skin = Some(skeleton);
        Ok(())
    }

    // ========================================================================
    // Matrix update pipeline
    // ========================================================================

    /// Recomposes every world matrix from the roots down, publishes mesh
    /// poses and weights, then refreshes all skinning matrices.
    pub fn update_matrix_world(&mut self) -> Result<()> {
        transform_system::update_hierarchy(&mut self.nodes, &mut self.meshes, &self.root_nodes)?;
        self.update_skeletons()
    }

    fn update_skeletons(&mut self) -> Result<()> {
        let nodes = &self.nodes;
        for skeleton in self.skins.values_mut() {
            skeleton.compute_joint_matrices(nodes)?;
        }
        Ok(())
    }

    // ========================================================================
    // Rest pose
    // ========================================================================

    /// Records the current TRS and morph weights of every node.
    #[must_use]
    pub fn capture_rest_pose(&self) -> RestPose {
        let mut entries = SecondaryMap::with_capacity(self.nodes.len());
        for (handle, node) in &self.nodes {
            let t = &node.transform;
            entries.insert(
                handle,
                (t.position, t.rotation, t.scale, node.morph_weights.clone()),
            );
        }
        RestPose { entries }
    }

    /// Puts every recorded node back into its captured pose.
    pub fn restore_rest_pose(&mut self, pose: &RestPose) {
        for (handle, (position, rotation, scale, weights)) in &pose.entries {
            if let Some(node) = self.nodes.get_mut(handle) {
                node.transform.position = *position;
                node.transform.rotation = *rotation;
                node.transform.scale = *scale;
                node.morph_weights = weights.clone();
            }
        }
    }
}

/// Chained node construction.
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    node: Node,
    parent: Option<NodeHandle>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        Self {
            scene,
            node: Node::new(name),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.node.transform.position = Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.node.transform.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.node.transform.scale = Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshKey) -> Self {
        self.node.mesh = Some(mesh);
        self
    }

    /// Inserts the node, under its parent if one was given, else as a root.
    pub fn build(self) -> Result<NodeHandle> {
        match self.parent {
            Some(parent) => {
                let handle = self.scene.nodes.insert(self.node);
                if let Err(e) = self.scene.attach(handle, parent) {
                    self.scene.nodes.remove(handle);
                    return Err(e);
                }
                Ok(handle)
            }
            None => Ok(self.scene.add_node(self.node)),
        }
    }
}
