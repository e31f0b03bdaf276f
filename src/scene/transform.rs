use glam::{Affine3A, Mat4, Quat, Vec3};

/// Transform component
///
/// Holds a node's translation, rotation and scale together with the cached
/// local and world matrices and the shadow state used for dirty checking.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    // === Matrix cache ===
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    // === Shadow state ===
    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            last_position: position,
            last_rotation: rotation,
            last_scale: scale,
            force_update: true,
        }
    }

    // ========================================================================
    // Shadow state check
    // ========================================================================

    /// Recomputes `local = T · R · S` if any TRS component changed since the
    /// last call. Returns whether the matrix changed.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    // ========================================================================
    // Getters & Helpers
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    pub(crate) fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Overwrites TRS with `other`'s values, leaving the matrix cache to the
    /// next update.
    pub fn set_trs_from(&mut self, other: &Transform) {
        self.position = other.position;
        self.rotation = other.rotation;
        self.scale = other.scale;
    }

    /// Forces the next update to recompute the local matrix.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
