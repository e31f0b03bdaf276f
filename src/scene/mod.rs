//! Scene graph module
//!
//! Manages the node hierarchy and the data attached to it:
//! - Node: scene node (parent/child links, transform, morph weights)
//! - Transform: TRS component with cached local/world matrices
//! - Scene: node, mesh and skin container
//! - Mesh: CPU-side primitive data and the pose written each frame
//! - Skeleton: joints and inverse bind matrices
//! - TransformSystem: decoupled world-matrix propagation

pub mod mesh;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use mesh::{Mesh, Primitive};
pub use node::Node;
pub use scene::{NodeBuilder, Scene};
pub use skeleton::Skeleton;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct SkeletonKey;
}
