use rustc_hash::FxHashMap;

use crate::animation::binding::ChannelBindings;
use crate::animation::clip::{AnimationClip, TrackData, TrackValue};
use crate::animation::tracks::KeyframeCursor;
use crate::errors::{AnimatorError, Result};
use crate::scene::{NodeHandle, Scene};

/// Animation system.
///
/// Binds the tracks of the active clip to their target nodes and writes
/// sampled values into node TRS slots and morph weights. Hierarchy
/// recomposition is left to [`Scene::update_matrix_world`].
pub struct AnimationSystem;

impl AnimationSystem {
    /// Makes `clip` the source of every node's channel bindings.
    ///
    /// Previous bindings are cleared. Fails without touching the scene if a
    /// track targets a missing node or two tracks drive the same channel.
    pub fn bind(scene: &mut Scene, clip: &AnimationClip) -> Result<()> {
        let mut bindings: FxHashMap<NodeHandle, ChannelBindings> = FxHashMap::default();

        for (index, track) in clip.tracks.iter().enumerate() {
            let Some(node) = scene.get_node(track.target) else {
                return Err(AnimatorError::InvalidHandle(format!(
                    "track {index} of clip '{}' targets a missing node",
                    clip.name
                )));
            };

            let path = track.data.target();
            let slot = bindings.entry(track.target).or_default().slot_mut(path);
            if let Some(existing) = *slot {
                return Err(AnimatorError::DuplicateChannel(format!(
                    "tracks {existing} and {index} of clip '{}' both drive {path:?} of node '{}'",
                    clip.name, node.name
                )));
            }
            *slot = Some(index);
        }

        for (handle, node) in &mut scene.nodes {
            node.animation = bindings.remove(&handle).unwrap_or_default();
        }

        log::debug!(
            "Bound clip '{}' ({} tracks, duration {:.3}s)",
            clip.name,
            clip.tracks.len(),
            clip.duration
        );
        Ok(())
    }

    /// Samples every bound track at `time` and writes the results into the
    /// target nodes. `clip` must be the clip last passed to [`Self::bind`].
    ///
    /// `time` must already lie in `[0, duration]`; tracks that end before
    /// `time` hold their final value. All tracks are sampled before any node
    /// is written, so a failure leaves the scene untouched.
    pub fn apply(
        scene: &mut Scene,
        clip: &AnimationClip,
        time: f32,
        cursors: &mut Vec<KeyframeCursor>,
    ) -> Result<()> {
        if !(0.0..=clip.duration).contains(&time) {
            return Err(AnimatorError::TimeOutOfRange {
                time,
                start: 0.0,
                end: clip.duration,
            });
        }
        cursors.resize(clip.tracks.len(), KeyframeCursor::default());

        let mut samples: Vec<(NodeHandle, TrackValue)> = Vec::with_capacity(clip.tracks.len());
        for (handle, node) in &scene.nodes {
            for (_, index) in node.animation.iter() {
                let track = Self::bound_track(clip, index)?;
                let local_time = time.min(track.end_time());
                let value = track.sample_with_cursor(local_time, &mut cursors[index])?;
                samples.push((handle, value));
            }
        }

        Self::write(scene, samples);
        Ok(())
    }

    /// Poses every bound node at keyframe `frame` of its track, without
    /// interpolation. Tracks with fewer keyframes hold their last one.
    pub fn apply_keyframe(scene: &mut Scene, clip: &AnimationClip, frame: usize) -> Result<()> {
        let mut samples: Vec<(NodeHandle, TrackValue)> = Vec::with_capacity(clip.tracks.len());
        for (handle, node) in &scene.nodes {
            for (_, index) in node.animation.iter() {
                let track = Self::bound_track(clip, index)?;
                let last = track.times().len() - 1;
                if let Some(value) = track.keyframe(frame.min(last)) {
                    samples.push((handle, value));
                }
            }
        }

        Self::write(scene, samples);
        Ok(())
    }

    fn bound_track(clip: &AnimationClip, index: usize) -> Result<&TrackData> {
        clip.tracks
            .get(index)
            .map(|t| &t.data)
            .ok_or_else(|| AnimatorError::AssetIndexOutOfBounds {
                context: format!("track binding into clip '{}'", clip.name),
                index,
            })
    }

    fn write(scene: &mut Scene, samples: Vec<(NodeHandle, TrackValue)>) {
        for (handle, value) in samples {
            if let Some(node) = scene.get_node_mut(handle) {
                node.apply_track_value(value);
            }
        }
    }
}
