//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`AnimatorError`] covers all failure modes including:
//! - Asset loading errors (missing accessors, bad indices, I/O)
//! - Accessor decoding errors (unsupported encodings, truncated buffers)
//! - Hierarchy errors (cycles, reparenting)
//! - Animation errors (malformed tracks, out-of-range queries)
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, AnimatorError>`.
//!
//! ```rust,ignore
//! use gltf_animator::errors::Result;
//!
//! fn load_asset() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the animator.
#[derive(Error, Debug)]
pub enum AnimatorError {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// A required accessor is absent (e.g. a primitive without positions).
    #[error("Missing accessor: {0}")]
    MissingAccessor(String),

    /// Asset index out of bounds.
    #[error("Asset index out of bounds: {context} (index: {index})")]
    AssetIndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    /// glTF parsing or loading error.
    #[error("glTF error: {0}")]
    GltfError(String),

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    // ========================================================================
    // Accessor Errors
    // ========================================================================
    /// The accessor's component type or layout cannot be decoded as requested.
    #[error("Unsupported accessor encoding: {0}")]
    UnsupportedAccessor(String),

    /// The accessor points outside of its backing buffer.
    #[error("Accessor out of range: needs {needed} bytes, buffer has {available}")]
    AccessorOutOfRange {
        /// Bytes required by the accessor layout
        needed: usize,
        /// Bytes actually present
        available: usize,
    },

    /// The decode buffer could not be allocated.
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// Attaching would make a node its own ancestor.
    #[error("Node hierarchy cycle: {0}")]
    HierarchyCycle(String),

    /// A node that already has a parent was attached again.
    #[error("Node already has a parent: {0}")]
    AlreadyParented(String),

    /// A handle does not refer to a live node, mesh or skeleton.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    // ========================================================================
    // Animation Errors
    // ========================================================================
    /// Keyframe data violates a track invariant.
    #[error("Invalid keyframe track: {0}")]
    InvalidTrack(String),

    /// Query time lies after the last keyframe of a track.
    #[error("Time {time} is outside track range [{start}, {end}]")]
    TimeOutOfRange {
        /// The requested time
        time: f32,
        /// First keyframe time
        start: f32,
        /// Last keyframe time
        end: f32,
    },

    /// Two tracks of one clip drive the same channel of the same node.
    #[error("Duplicate animation channel: {0}")]
    DuplicateChannel(String),

    /// A skinned vertex references a joint the skin does not define.
    #[error("Joint index {index} exceeds skin joint count {count}")]
    JointOutOfRange {
        /// The offending joint index
        index: usize,
        /// Number of joints in the skin
        count: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// An error annotated with the asset, accessor or node being processed.
    #[error("{context}: {source}")]
    Context {
        /// What was being loaded
        context: String,
        /// The underlying failure
        #[source]
        source: Box<AnimatorError>,
    },
}

impl AnimatorError {
    /// The innermost error, looking through any [`AnimatorError::Context`] layers.
    #[must_use]
    pub fn root_cause(&self) -> &AnimatorError {
        match self {
            AnimatorError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Attaches a lazily built description to an error result.
pub trait ResultExt<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|source| AnimatorError::Context {
            context: f(),
            source: Box::new(source),
        })
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

#[cfg(feature = "gltf")]
impl From<gltf::Error> for AnimatorError {
    fn from(err: gltf::Error) -> Self {
        AnimatorError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, AnimatorError>`.
pub type Result<T> = std::result::Result<T, AnimatorError>;
