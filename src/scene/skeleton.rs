use glam::Mat4;
use slotmap::SlotMap;

use crate::errors::{AnimatorError, Result};
use crate::scene::{Node, NodeHandle};

/// Skin binding: an ordered joint list plus one inverse bind matrix per joint.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,

    // === Core Data ===
    // Ordered bone list: bones[i] corresponds to joint index i in the
    // per-vertex JOINTS attribute
    pub bones: Vec<NodeHandle>,

    // Maps mesh-space vertices into each bone's local space at bind time.
    // Static after load.
    pub(crate) inverse_bind_matrices: Vec<Mat4>,

    // === Runtime Data ===
    // Recomputed every frame after the hierarchy update
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Fails unless there is exactly one inverse bind matrix per bone.
    pub fn new(name: &str, bones: Vec<NodeHandle>, inverse_bind_matrices: Vec<Mat4>) -> Result<Self> {
        if bones.len() != inverse_bind_matrices.len() {
            return Err(AnimatorError::GltfError(format!(
                "skin '{name}' has {} joints but {} inverse bind matrices",
                bones.len(),
                inverse_bind_matrices.len()
            )));
        }

        let count = bones.len();
        Ok(Self {
            name: name.to_string(),
            bones,
            inverse_bind_matrices,
            joint_matrices: vec![Mat4::IDENTITY; count],
        })
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    /// Skinning matrices from the last [`Self::compute_joint_matrices`].
    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Joint matrices as raw bytes, ready for a storage buffer upload.
    #[must_use]
    pub fn joint_matrices_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.joint_matrices)
    }

    /// Errors if a vertex joint index does not name a joint of this skin.
    pub fn validate_joint_index(&self, index: u32) -> Result<()> {
        let index = index as usize;
        if index >= self.bones.len() {
            return Err(AnimatorError::JointOutOfRange {
                index,
                count: self.bones.len(),
            });
        }
        Ok(())
    }

    /// Updates the skinning matrices:
    /// `joint_matrices[j] = world(bones[j]) × inverse_bind_matrices[j]`.
    ///
    /// Must run after the hierarchy update so bone world matrices are current.
    pub fn compute_joint_matrices(&mut self, nodes: &SlotMap<NodeHandle, Node>) -> Result<()> {
        for (i, &bone_handle) in self.bones.iter().enumerate() {
            let Some(bone_node) = nodes.get(bone_handle) else {
                return Err(AnimatorError::InvalidHandle(format!(
                    "joint {i} of skin '{}' refers to a missing node",
                    self.name
                )));
            };
            // IBM first (into bone local space), then the bone's current world transform
            self.joint_matrices[i] =
                Mat4::from(bone_node.transform.world_matrix) * self.inverse_bind_matrices[i];
        }
        Ok(())
    }
}
