use crate::animation::clip::AnimationClip;
use crate::errors::{AnimatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

/// Playback state of the current clip.
///
/// The context is a plain value: every transition consumes it and returns
/// the next state, so the caller decides when a frame's state is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub clip_index: usize,
    pub time: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Playback {
    #[must_use]
    pub fn new(clip_index: usize) -> Self {
        Self {
            clip_index,
            time: 0.0,
            time_scale: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
        }
    }

    #[must_use]
    pub fn with_loop_mode(self, loop_mode: LoopMode) -> Self {
        Self { loop_mode, ..self }
    }

    /// Advances time by `elapsed` seconds and wraps it into the clip range.
    ///
    /// A zero-duration clip is a static pose: time is left untouched.
    #[must_use]
    pub fn advance(self, clip: &AnimationClip, elapsed: f32) -> Self {
        if self.paused || clip.is_static() {
            return self;
        }
        self.wrapped(clip.duration, self.time + elapsed * self.time_scale)
    }

    /// Jumps to `time`, wrapped like [`Playback::advance`].
    #[must_use]
    pub fn seek(self, clip: &AnimationClip, time: f32) -> Self {
        if clip.is_static() {
            return Self { time: 0.0, ..self };
        }
        self.wrapped(clip.duration, time)
    }

    fn wrapped(mut self, duration: f32, time: f32) -> Self {
        match self.loop_mode {
            LoopMode::Once => {
                // Play once, stop at end or start
                if time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                } else {
                    self.time = time;
                }
            }
            LoopMode::Loop => {
                self.time = time.rem_euclid(duration);
                // rem_euclid can round up to `duration` for tiny negative inputs
                if self.time >= duration {
                    self.time = 0.0;
                }
            }
            LoopMode::PingPong => {
                let double_duration = duration * 2.0;
                let mut t = time.rem_euclid(double_duration);
                // Second half of the cycle runs backwards
                if t > duration {
                    t = double_duration - t;
                }
                self.time = t;
            }
        }
        self
    }

    /// Makes clip `index` current and rewinds to its start.
    pub fn switch_to(self, index: usize, clip_count: usize) -> Result<Self> {
        if index >= clip_count {
            return Err(AnimatorError::AssetIndexOutOfBounds {
                context: "animation clip".to_string(),
                index,
            });
        }
        Ok(Self {
            clip_index: index,
            time: 0.0,
            paused: false,
            ..self
        })
    }

    /// Cycles to the following clip, wrapping to the first.
    #[must_use]
    pub fn next_clip(self, clip_count: usize) -> Self {
        if clip_count == 0 {
            return self;
        }
        let index = (self.clip_index + 1) % clip_count;
        Self {
            clip_index: index,
            time: 0.0,
            paused: false,
            ..self
        }
    }

    /// Cycles to the preceding clip, wrapping to the last.
    #[must_use]
    pub fn previous_clip(self, clip_count: usize) -> Self {
        if clip_count == 0 {
            return self;
        }
        let index = (self.clip_index + clip_count - 1) % clip_count;
        Self {
            clip_index: index,
            time: 0.0,
            paused: false,
            ..self
        }
    }
}
