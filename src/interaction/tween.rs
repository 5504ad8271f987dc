//! Interpolation helpers for the per-frame animation state.
//!
//! Every animated quantity in the widget (spin speed, scale) is a
//! (current, target) pair advanced by [`lerp_clamped`] once per tick with a
//! time-delta-scaled factor, so animations are frame-rate independent.

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear interpolation with the factor clamped to `[0, 1]`.
///
/// The result always lies between `a` and `b` inclusive, and equals `b`
/// exactly once `t >= 1`, so callers can pass `delta_time * rate` without
/// overshooting on long frames.
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Upper bound on the apparent spin rate, in radians per second.
pub const SPIN_RATE_CAP: f32 = 50.0;

/// Maps the unbounded spin-speed accumulator to an angular rate.
///
/// Saturating exponential: monotonically increasing in `speed` and
/// asymptotically approaching [`SPIN_RATE_CAP`], so repeated clicks keep
/// accelerating the chinchilla without ever spinning it unreadably fast.
pub fn spin_rate(speed: f32) -> f32 {
    -SPIN_RATE_CAP * (-speed / SPIN_RATE_CAP).exp() + SPIN_RATE_CAP
}
