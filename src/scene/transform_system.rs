//! Transform System
//!
//! Propagates world matrices down the node hierarchy, decoupled from
//! [`Scene`](crate::scene::Scene) so it only borrows the node and mesh maps.
//!
//! The walk is an explicit-stack depth-first pre-order traversal, so deep
//! hierarchies cannot overflow the call stack. A parent is always finalized
//! before any of its children, and a node whose parent changed is
//! recomputed even when its own TRS did not.

use glam::{Affine3A, Mat4};
use slotmap::{SecondaryMap, SlotMap};

use crate::errors::{AnimatorError, Result};
use crate::scene::mesh::Mesh;
use crate::scene::node::Node;
use crate::scene::{MeshKey, NodeHandle};

/// Updates the world matrix of every node reachable from `roots`, then
/// publishes each mesh node's world matrix and morph weights into its mesh.
///
/// When several nodes instance one mesh, the last node visited wins.
///
/// Fails with [`AnimatorError::HierarchyCycle`] if a node is reached twice,
/// which only happens when the parent/child links were corrupted.
pub fn update_hierarchy(
    nodes: &mut SlotMap<NodeHandle, Node>,
    meshes: &mut SlotMap<MeshKey, Mesh>,
    roots: &[NodeHandle],
) -> Result<()> {
    // Work stack: (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);
    let mut visited: SecondaryMap<NodeHandle, ()> = SecondaryMap::with_capacity(nodes.len());

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };
        if visited.insert(node_handle, ()).is_some() {
            return Err(AnimatorError::HierarchyCycle(format!(
                "node '{}' reached twice during traversal",
                node.name
            )));
        }

        // 1. Local matrix
        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        // 2. World matrix
        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
        }

        // 3. Mesh pose and weights
        if let Some(mesh) = node.mesh.and_then(|key| meshes.get_mut(key)) {
            mesh.pose_matrix = Mat4::from(node.transform.world_matrix);
            let count = mesh.morph_target_count();
            mesh.morph_weights.clear();
            mesh.morph_weights.extend(node.morph_weights.iter().copied().take(count));
            mesh.morph_weights.resize(count, 0.0);
        }

        // 4. Children, reversed so they pop in order
        let current_world = node.transform.world_matrix;
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }

    Ok(())
}
