//! A loaded asset: the scene graph plus its animation clips.
//!
//! [`Model`] owns every node, mesh, skin and clip. Per-frame evaluation is
//! driven by an explicit [`Playback`] value that the caller keeps and passes
//! back in, so playback state never lives inside the model.

use crate::animation::clip::AnimationClip;
use crate::animation::playback::Playback;
use crate::animation::system::AnimationSystem;
use crate::animation::tracks::KeyframeCursor;
use crate::errors::{AnimatorError, Result};
use crate::scene::scene::RestPose;
use crate::scene::Scene;
use crate::settings::LoadSettings;

#[derive(Debug, Clone)]
pub struct Model {
    pub scene: Scene,
    pub clips: Vec<AnimationClip>,
    settings: LoadSettings,
    rest_pose: RestPose,
    bound_clip: Option<usize>,
    cursors: Vec<KeyframeCursor>,
}

impl Model {
    /// Takes ownership of a built scene and its clips.
    ///
    /// The scene's current TRS values become the rest pose. Every clip is
    /// bound once to check that its targets exist and no channel is driven
    /// twice; the first clip is left active and world matrices are computed.
    pub fn new(scene: Scene, clips: Vec<AnimationClip>, settings: LoadSettings) -> Result<Self> {
        let rest_pose = scene.capture_rest_pose();
        let mut model = Self {
            scene,
            clips,
            settings,
            rest_pose,
            bound_clip: None,
            cursors: Vec::new(),
        };

        for clip in &model.clips {
            AnimationSystem::bind(&mut model.scene, clip)?;
        }
        if model.clips.is_empty() {
            model.scene.update_matrix_world()?;
        } else {
            let playback = model.playback();
            model.evaluate(&playback)?;
        }
        Ok(model)
    }

    #[must_use]
    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn clip(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    #[must_use]
    pub fn find_clip(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    /// Index of the clip currently bound to the scene.
    #[must_use]
    pub fn active_clip(&self) -> Option<usize> {
        self.bound_clip
    }

    /// A fresh playback context on the first clip.
    #[must_use]
    pub fn playback(&self) -> Playback {
        Playback::new(0).with_loop_mode(self.settings.loop_mode)
    }

    /// Poses the scene at `playback.time` of its clip and recomputes every
    /// world, pose and skinning matrix.
    ///
    /// If a track cannot be sampled, node TRS values are left untouched.
    pub fn evaluate(&mut self, playback: &Playback) -> Result<()> {
        if self.clips.is_empty() {
            return self.scene.update_matrix_world();
        }
        self.activate(playback.clip_index)?;

        let clip = &self.clips[playback.clip_index];
        AnimationSystem::apply(&mut self.scene, clip, playback.time, &mut self.cursors)?;
        self.scene.update_matrix_world()
    }

    /// Advances `playback` by `elapsed` seconds, evaluates the new time and
    /// returns the advanced context.
    pub fn tick(&mut self, playback: Playback, elapsed: f32) -> Result<Playback> {
        let Some(clip) = self.clips.get(playback.clip_index) else {
            if self.clips.is_empty() {
                self.scene.update_matrix_world()?;
                return Ok(playback);
            }
            return Err(Self::clip_out_of_bounds(playback.clip_index));
        };

        let next = playback.advance(clip, elapsed);
        self.evaluate(&next)?;
        Ok(next)
    }

    /// Makes clip `index` current at time zero. Nodes return to their rest
    /// pose first, so nothing carries over from the previous clip.
    pub fn switch_clip(&mut self, playback: Playback, index: usize) -> Result<Playback> {
        let next = playback.switch_to(index, self.clips.len())?;
        self.evaluate(&next)?;
        log::info!("Switched to clip {index} '{}'", self.clips[index].name);
        Ok(next)
    }

    /// Cycles forward through the clips, wrapping to the first.
    pub fn next_clip(&mut self, playback: Playback) -> Result<Playback> {
        let next = playback.next_clip(self.clips.len());
        self.evaluate(&next)?;
        Ok(next)
    }

    /// Cycles backward through the clips, wrapping to the last.
    pub fn previous_clip(&mut self, playback: Playback) -> Result<Playback> {
        let next = playback.previous_clip(self.clips.len());
        self.evaluate(&next)?;
        Ok(next)
    }

    /// Poses the scene at keyframe `frame` of the playback's clip, without
    /// interpolation. Tracks shorter than `frame` hold their last keyframe.
    pub fn pose_keyframe(&mut self, playback: &Playback, frame: usize) -> Result<()> {
        if self.clips.is_empty() {
            return self.scene.update_matrix_world();
        }
        self.activate(playback.clip_index)?;

        let clip = &self.clips[playback.clip_index];
        AnimationSystem::apply_keyframe(&mut self.scene, clip, frame)?;
        self.scene.update_matrix_world()
    }

    fn activate(&mut self, index: usize) -> Result<()> {
        if self.bound_clip == Some(index) {
            return Ok(());
        }
        let clip = self
            .clips
            .get(index)
            .ok_or_else(|| Self::clip_out_of_bounds(index))?;

        self.bound_clip = None;
        self.scene.restore_rest_pose(&self.rest_pose);
        AnimationSystem::bind(&mut self.scene, clip)?;
        self.cursors.clear();
        self.bound_clip = Some(index);
        Ok(())
    }

    fn clip_out_of_bounds(index: usize) -> AnimatorError {
        AnimatorError::AssetIndexOutOfBounds {
            context: "animation clip".to_string(),
            index,
        }
    }
}
