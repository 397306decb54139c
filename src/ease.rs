//! Easing curves for the reveal phases.
//!
//! Only the power family is needed. `OutQuad` is what tween libraries call
//! `power1.out` and `InOutCubic` is `power2.inOut`; those two shape the
//! default schedule, the others are reachable from config.

use serde::Deserialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    /// Map phase progress in [0,1] to eased progress in [0,1].
    pub fn sample(self, x: f32) -> f32 {
        let t = x.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InQuad => power_in(t, 2),
            Ease::InCubic => power_in(t, 3),
            Ease::OutQuad => power_out(t, 2),
            Ease::OutCubic => power_out(t, 3),
            Ease::InOutQuad => power_in_out(t, 2),
            Ease::InOutCubic => power_in_out(t, 3),
        }
    }
}

#[inline]
fn power_in(t: f32, p: i32) -> f32 {
    t.powi(p)
}

#[inline]
fn power_out(t: f32, p: i32) -> f32 {
    1.0 - power_in(1.0 - t, p)
}

/// First half accelerates, second half mirrors it.
#[inline]
fn power_in_out(t: f32, p: i32) -> f32 {
    if t < 0.5 {
        power_in(2.0 * t, p) * 0.5
    } else {
        1.0 - power_in(2.0 - 2.0 * t, p) * 0.5
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
