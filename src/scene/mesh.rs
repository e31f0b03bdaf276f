use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::{AnimatorError, Result};

/// De-interleaved vertex data of one draw call.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_coords: Option<Vec<Vec2>>,
    pub indices: Option<Vec<u32>>,
    /// Up to four joint indices per vertex (`JOINTS_0`).
    pub joints: Option<Vec<[u32; 4]>>,
    /// Matching skin weights per vertex (`WEIGHTS_0`).
    pub weights: Option<Vec<Vec4>>,
    /// Position displacements, one array per morph target.
    pub morph_targets: Vec<Vec<Vec3>>,
}

impl Primitive {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Largest joint index referenced by any vertex.
    #[must_use]
    pub fn max_joint_index(&self) -> Option<u32> {
        self.joints
            .as_ref()?
            .iter()
            .flat_map(|j| j.iter().copied())
            .max()
    }

    /// Skinned positions: `Σ_k weight[k] × joint_matrices[joint[k]] × position`.
    ///
    /// Vertices without skin attributes are returned unchanged. Weights are
    /// used as given, without renormalization.
    pub fn skinned_positions(&self, joint_matrices: &[Mat4]) -> Result<Vec<Vec3>> {
        let (Some(joints), Some(weights)) = (&self.joints, &self.weights) else {
            return Ok(self.positions.clone());
        };

        self.positions
            .iter()
            .zip(joints.iter().zip(weights.iter()))
            .map(|(&position, (joint, weight))| {
                let mut skin = Mat4::ZERO;
                for (k, &index) in joint.iter().enumerate() {
                    let w = weight[k];
                    if w == 0.0 {
                        continue;
                    }
                    let matrix = joint_matrices.get(index as usize).ok_or(
                        AnimatorError::JointOutOfRange {
                            index: index as usize,
                            count: joint_matrices.len(),
                        },
                    )?;
                    skin += *matrix * w;
                }
                Ok(skin.transform_point3(position))
            })
            .collect()
    }

    /// Base positions plus the weighted sum of target displacements.
    /// Missing weights count as zero; extra weights are ignored.
    #[must_use]
    pub fn morphed_positions(&self, weights: &[f32]) -> Vec<Vec3> {
        let mut out = self.positions.clone();
        for (target, &w) in self.morph_targets.iter().zip(weights) {
            if w == 0.0 {
                continue;
            }
            for (p, d) in out.iter_mut().zip(target) {
                *p += *d * w;
            }
        }
        out
    }
}

/// A loaded mesh and the per-frame state published to the renderer.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
    /// World matrix of the node that last drew this mesh.
    pub pose_matrix: Mat4,
    /// Blend weights, one per morph target.
    pub morph_weights: Vec<f32>,
    /// Default weights declared by the mesh itself.
    pub default_weights: Vec<f32>,
}

impl Mesh {
    #[must_use]
    pub fn new(name: &str, primitives: Vec<Primitive>) -> Self {
        let mut mesh = Self {
            name: name.to_string(),
            primitives,
            pose_matrix: Mat4::IDENTITY,
            morph_weights: Vec::new(),
            default_weights: Vec::new(),
        };
        mesh.morph_weights = vec![0.0; mesh.morph_target_count()];
        mesh
    }

    /// Morph targets shared by all primitives (the largest per-primitive count).
    #[must_use]
    pub fn morph_target_count(&self) -> usize {
        self.primitives
            .iter()
            .map(|p| p.morph_targets.len())
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn max_joint_index(&self) -> Option<u32> {
        self.primitives.iter().filter_map(Primitive::max_joint_index).max()
    }

    /// Pose matrix as raw bytes for upload.
    #[must_use]
    pub fn pose_matrix_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.pose_matrix)
    }
}
