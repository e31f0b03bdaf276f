//! Keyframe animation: tracks, clips, playback state and clip evaluation.

pub mod values;
pub mod tracks;
pub mod clip;
pub mod binding;
pub mod playback;
pub mod system;

pub use clip::{AnimationClip, DurationPolicy, Track, TrackData, TrackValue};
pub use binding::{ChannelBindings, TargetPath};
pub use playback::{LoopMode, Playback};
pub use system::AnimationSystem;
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::{Interpolatable, MorphWeights};
