use crate::animation::values::Interpolatable;
use crate::errors::{AnimatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe interval so forward playback finds the next
/// frame in O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// A single animated channel: strictly increasing times paired with values.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>, // For CubicSpline, length is times.len() * 3
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track, rejecting empty, non-finite or non-increasing time
    /// arrays and value arrays whose length does not match the keyframes.
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Result<Self> {
        if times.is_empty() {
            return Err(AnimatorError::InvalidTrack("track has no keyframes".to_string()));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(AnimatorError::InvalidTrack(format!(
                "non-finite keyframe time {bad}"
            )));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AnimatorError::InvalidTrack(format!(
                "keyframe times not strictly increasing at index {}: {} -> {}",
                i + 1,
                times[i],
                times[i + 1]
            )));
        }

        let expected = match interpolation {
            InterpolationMode::CubicSpline => times.len() * 3,
            _ => times.len(),
        };
        if values.len() != expected {
            return Err(AnimatorError::InvalidTrack(format!(
                "{} keyframes need {expected} values, got {}",
                times.len(),
                values.len()
            )));
        }

        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    /// Number of keyframes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.times[0]
    }

    #[inline]
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times[self.times.len() - 1]
    }

    /// Value stored at keyframe `index` (the spline value for CubicSpline).
    #[must_use]
    pub fn keyframe(&self, index: usize) -> Option<&T> {
        (index < self.times.len()).then(|| self.get_value_at(index))
    }

    /// Finds the greatest `i` with `times[i] <= time`. Times before the first
    /// keyframe clamp to 0; times after the last keyframe are an error.
    pub fn frame_index(&self, time: f32) -> Result<usize> {
        self.check_range(time)?;
        let next_idx = self.times.partition_point(|&t| t <= time);
        Ok(next_idx.saturating_sub(1))
    }

    /// Samples the track at `time`.
    pub fn sample(&self, time: f32) -> Result<T> {
        let index = self.frame_index(time)?;
        Ok(self.sample_at_frame(index, time))
    }

    /// Sampling with cursor. `cursor` is updated to the interval found.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Result<T> {
        self.check_range(time)?;

        let len = self.times.len();
        // Fast path: static data (single keyframe)
        if len == 1 {
            return Ok(self.get_value_at(0).clone());
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found_index = if time >= t_curr {
            // Forward playback: check [i, i+1), [i+1, i+2), ...
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    res = Some(len - 1);
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backward playback or loop reset
            let mut res = None;
            for offset in 1..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let final_index = found_index.unwrap_or_else(|| {
            // Large jump: fall back to binary search
            self.times.partition_point(|&t| t <= time).saturating_sub(1)
        });
        cursor.last_index = final_index;

        Ok(self.sample_at_frame(final_index, time))
    }

    fn check_range(&self, time: f32) -> Result<()> {
        let end = self.end_time();
        if time > end || time.is_nan() {
            return Err(AnimatorError::TimeOutOfRange {
                time,
                start: self.start_time(),
                end,
            });
        }
        Ok(())
    }

    /// For Linear/Step, the index is used directly.
    /// For CubicSpline, the value is at index * 3 + 1.
    fn get_value_at(&self, index: usize) -> &T {
        match self.interpolation {
            InterpolationMode::CubicSpline => &self.values[index * 3 + 1],
            _ => &self.values[index],
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();

        // No next frame available
        if index >= len - 1 {
            return self.get_value_at(len - 1).clone();
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = ((time - t0) / dt).clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.get_value_at(index).clone(),
            InterpolationMode::Linear => {
                let v0 = self.get_value_at(index);
                let v1 = self.get_value_at(next_idx);
                T::interpolate_linear(v0, v1, t)
            }
            InterpolationMode::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;

                let v0 = &self.values[i_prev + 1];
                let out_tangent0 = &self.values[i_prev + 2];
                let in_tangent1 = &self.values[i_next];
                let v1 = &self.values[i_next + 1];

                T::interpolate_cubic(v0, out_tangent0, in_tangent1, v1, t, dt)
            }
        }
    }
}
