//! Load and playback configuration.

use crate::animation::clip::DurationPolicy;
use crate::animation::playback::LoopMode;

/// Options applied while a model is loaded.
///
/// All fields have sensible defaults; override selectively with
/// struct-update syntax:
///
/// ```rust,ignore
/// use gltf_animator::{DurationPolicy, LoadSettings};
///
/// // Reproduce the first-track duration of older viewers
/// let legacy = LoadSettings {
///     duration_policy: DurationPolicy::FirstTrack,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LoadSettings {
    /// How each clip derives its duration from its tracks.
    ///
    /// - `LongestTrack`: the latest final keyframe across all tracks
    /// - `FirstTrack`: the final keyframe of the first track only
    pub duration_policy: DurationPolicy,

    /// Loop mode of playback contexts created by [`Model::playback`](crate::Model::playback).
    pub loop_mode: LoopMode,

    /// Fail the load when a vertex references a joint its skin does not
    /// define. When `false` the mismatch is only logged.
    pub strict_skin_joints: bool,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            duration_policy: DurationPolicy::LongestTrack,
            loop_mode: LoopMode::Loop,
            strict_skin_joints: true,
        }
    }
}
