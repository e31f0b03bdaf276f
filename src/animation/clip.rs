use glam::{Mat4, Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use crate::animation::values::MorphWeights;
use crate::errors::{AnimatorError, Result};
use crate::scene::NodeHandle;

/// Keyframe data of one channel, tagged by the node property it drives.
#[derive(Debug, Clone)]
pub enum TrackData {
    Translation(KeyframeTrack<Vec3>),
    Rotation(KeyframeTrack<Quat>),
    Scale(KeyframeTrack<Vec3>),
    Weights(KeyframeTrack<MorphWeights>),
}

/// A sampled pose value.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
    Weights(MorphWeights),
}

impl TrackValue {
    /// The 4×4 transform of a TRS sample; `None` for morph weights.
    #[must_use]
    pub fn to_matrix(&self) -> Option<Mat4> {
        match self {
            Self::Translation(t) => Some(Mat4::from_translation(*t)),
            Self::Rotation(r) => Some(Mat4::from_quat(*r)),
            Self::Scale(s) => Some(Mat4::from_scale(*s)),
            Self::Weights(_) => None,
        }
    }
}

macro_rules! dispatch {
    ($data:expr, $track:ident => $body:expr) => {
        match $data {
            TrackData::Translation($track) => $body,
            TrackData::Rotation($track) => $body,
            TrackData::Scale($track) => $body,
            TrackData::Weights($track) => $body,
        }
    };
}

macro_rules! dispatch_value {
    ($data:expr, $track:ident => $body:expr) => {
        match $data {
            TrackData::Translation($track) => TrackValue::Translation($body),
            TrackData::Rotation($track) => TrackValue::Rotation($body),
            TrackData::Scale($track) => TrackValue::Scale($body),
            TrackData::Weights($track) => TrackValue::Weights($body),
        }
    };
}

impl TrackData {
    /// Builds a morph-weight track from a flat output array holding
    /// `N` weights per keyframe (three groups of `N` per keyframe for
    /// CubicSpline).
    pub fn weights(
        times: Vec<f32>,
        flat: &[f32],
        interpolation: InterpolationMode,
    ) -> Result<Self> {
        let groups = match interpolation {
            InterpolationMode::CubicSpline => times.len() * 3,
            _ => times.len(),
        };
        if groups == 0 || flat.is_empty() || flat.len() % groups != 0 {
            return Err(AnimatorError::InvalidTrack(format!(
                "{} weight values cannot be split into {groups} keyframe groups",
                flat.len()
            )));
        }
        let width = flat.len() / groups;
        let values = flat.chunks_exact(width).map(MorphWeights::from_slice).collect();
        Ok(Self::Weights(KeyframeTrack::new(times, values, interpolation)?))
    }

    #[must_use]
    pub fn target(&self) -> TargetPath {
        match self {
            Self::Translation(_) => TargetPath::Translation,
            Self::Rotation(_) => TargetPath::Rotation,
            Self::Scale(_) => TargetPath::Scale,
            Self::Weights(_) => TargetPath::Weights,
        }
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        dispatch!(self, t => t.times())
    }

    #[must_use]
    pub fn end_time(&self) -> f32 {
        dispatch!(self, t => t.end_time())
    }

    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        dispatch!(self, t => t.interpolation())
    }

    pub fn sample(&self, time: f32) -> Result<TrackValue> {
        Ok(dispatch_value!(self, t => t.sample(time)?))
    }

    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Result<TrackValue> {
        Ok(dispatch_value!(self, t => t.sample_with_cursor(time, cursor)?))
    }

    /// The stored value of keyframe `index`, without interpolation.
    #[must_use]
    pub fn keyframe(&self, index: usize) -> Option<TrackValue> {
        Some(dispatch_value!(self, t => t.keyframe(index)?.clone()))
    }
}

/// One channel of a clip, bound to its target node.
#[derive(Debug, Clone)]
pub struct Track {
    pub target: NodeHandle,
    pub data: TrackData,
}

/// How a clip derives its duration from its tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationPolicy {
    /// Latest final timestamp across all tracks.
    #[default]
    LongestTrack,
    /// Final timestamp of the first track only.
    FirstTrack,
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: String, tracks: Vec<Track>) -> Self {
        Self::with_duration_policy(name, tracks, DurationPolicy::default())
    }

    #[must_use]
    pub fn with_duration_policy(name: String, tracks: Vec<Track>, policy: DurationPolicy) -> Self {
        let duration = match policy {
            DurationPolicy::LongestTrack => tracks
                .iter()
                .map(|t| t.data.end_time())
                .fold(0.0_f32, f32::max),
            DurationPolicy::FirstTrack => tracks.first().map_or(0.0, |t| t.data.end_time()),
        };

        Self {
            name,
            duration,
            tracks,
        }
    }

    /// Clips whose duration is zero hold a static pose.
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.duration <= 0.0
    }
}
