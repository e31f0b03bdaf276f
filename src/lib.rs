#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! glTF 2.0 scene-graph animation engine.
//!
//! Loads a node hierarchy, meshes, skins and animation clips, then on each
//! frame samples the active clip, recomposes world transforms top-down and
//! derives the pose, skinning and morph data a renderer consumes.

pub mod accessor;
pub mod animation;
pub mod assets;
pub mod errors;
pub mod model;
pub mod scene;
pub mod settings;

pub use animation::{
    AnimationClip, AnimationSystem, DurationPolicy, InterpolationMode, KeyframeTrack, LoopMode,
    MorphWeights, Playback, TargetPath, Track, TrackData, TrackValue,
};
#[cfg(feature = "gltf")]
pub use assets::GltfLoader;
pub use errors::{AnimatorError, Result};
pub use model::Model;
pub use scene::{Mesh, Node, NodeHandle, Primitive, Scene, Skeleton, Transform};
pub use settings::LoadSettings;
