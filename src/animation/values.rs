use std::ops::Deref;

use glam::{Quat, Vec3, Vec4};
use smallvec::SmallVec;

/// Inline capacity for morph weights; larger target counts spill to the heap.
pub const INLINE_MORPH_TARGETS: usize = 8;

/// A keyframe value that can be blended between two samples.
pub trait Interpolatable: Clone + Sized {
    /// Blend `start → end` by `t ∈ [0, 1]`.
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;

    /// Cubic Hermite spline segment between `v0` and `v1`. Tangents are
    /// stored per unit time and scaled here by the keyframe interval `dt`.
    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self;
}

/// Hermite basis `(s0, s1, s2, s3)` for value0, tangent0, value1, tangent1.
#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

/// Per-keyframe morph target weights, one entry per target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MorphWeights(pub SmallVec<[f32; INLINE_MORPH_TARGETS]>);

impl MorphWeights {
    #[must_use]
    pub fn from_slice(weights: &[f32]) -> Self {
        Self(SmallVec::from_slice(weights))
    }

    #[must_use]
    pub fn zeros(count: usize) -> Self {
        Self(SmallVec::from_elem(0.0, count))
    }

    /// Resizes to `count` targets, padding with zero weights.
    pub fn resize(&mut self, count: usize) {
        self.0.resize(count, 0.0);
    }
}

impl Deref for MorphWeights {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

impl Interpolatable for MorphWeights {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        Self(
            start
                .iter()
                .zip(end.iter())
                .map(|(a, b)| a + (b - a) * t)
                .collect(),
        )
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        Self(
            (0..v0.len())
                .map(|i| {
                    let m0 = out_tangent0[i] * dt;
                    let m1 = in_tangent1[i] * dt;
                    s0 * v0[i] + s1 * m0 + s2 * v1[i] + s3 * m1
                })
                .collect(),
        )
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let m0 = *out_tangent0 * dt;
        let m1 = *in_tangent1 * dt;
        *v0 * s0 + m0 * s1 + *v1 * s2 + m1 * s3
    }
}

impl Interpolatable for Quat {
    /// Shortest-path slerp, renormalized so accumulated float error never
    /// leaks a non-unit rotation into the transform.
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.slerp(*end, t).normalize()
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);

        let v0_v = Vec4::from(*v0);
        let v1_v = Vec4::from(*v1);
        let m0_v = Vec4::from(*out_tangent0) * dt;
        let m1_v = Vec4::from(*in_tangent1) * dt;

        let result = v0_v * s0 + m0_v * s1 + v1_v * s2 + m1_v * s3;

        Quat::from_vec4(result).normalize()
    }
}
