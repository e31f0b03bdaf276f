use crate::animation::binding::ChannelBindings;
use crate::animation::clip::TrackValue;
use crate::animation::values::MorphWeights;
use crate::scene::transform::Transform;
use crate::scene::{MeshKey, NodeHandle, SkeletonKey};
use glam::Affine3A;

/// A scene node.
///
/// # Design Principles
///
/// - Keeps the data traversed every frame (hierarchy, transform, weights)
/// - Meshes and skins live in the Scene's slot maps and are referenced by key
///
/// # Hierarchy
///
/// Nodes form a forest through parent-child relationships:
/// - `parent`: Optional handle to parent node (None for root nodes)
/// - `children`: Ordered list of child node handles
///
/// Links are only changed through [`Scene::attach`](crate::scene::Scene::attach),
/// which refuses cycles and second parents.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    pub transform: Transform,

    // === Components ===
    pub mesh: Option<MeshKey>,
    pub skin: Option<SkeletonKey>,

    /// Current morph target weights, copied into the mesh during the
    /// world update.
    pub morph_weights: MorphWeights,

    /// Tracks of the active clip that drive this node.
    pub(crate) animation: ChannelBindings,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            mesh: None,
            skin: None,
            morph_weights: MorphWeights::default(),
            animation: ChannelBindings::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// World transform computed by the last hierarchy update.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    /// Channels of the active clip bound to this node.
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &ChannelBindings {
        &self.animation
    }

    /// Writes one sampled channel value into the node.
    pub fn apply_track_value(&mut self, value: TrackValue) {
        match value {
            TrackValue::Translation(v) => self.transform.position = v,
            TrackValue::Rotation(q) => self.transform.rotation = q,
            TrackValue::Scale(s) => self.transform.scale = s,
            TrackValue::Weights(w) => {
                // Keep the node's target count when a track carries fewer or more weights
                let count = self.morph_weights.len();
                self.morph_weights = w;
                if count > 0 {
                    self.morph_weights.resize(count);
                }
            }
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
