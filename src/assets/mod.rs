//! Asset loading.
//!
//! Parsers turn an external document into a [`Model`](crate::Model) once, at
//! load time; nothing here runs per frame.

pub mod loaders;

#[cfg(feature = "gltf")]
pub use loaders::GltfLoader;
