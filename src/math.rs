//! Mathematical utilities and nalgebra extensions

use nalgebra::Vector3;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Length of one angular cycle in degrees
pub const FULL_TURN: f32 = 360.0;
const HALF_TURN: f32 = 180.0;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// True when every component is finite
    fn is_finite(&self) -> bool;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.norm();
        if mag > 0.0 { *self / mag } else { Vector3::zeros() }
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|c| c.is_finite())
    }
}

/// Bring an angular difference into [-180, 180] by whole turns
///
/// Values already in range come back bit-for-bit unchanged. Anything else is
/// reduced in a single step, so arbitrarily large finite input is fine.
pub fn wrap_difference(diff: f32) -> f32 {
    if (-HALF_TURN..=HALF_TURN).contains(&diff) {
        return diff;
    }
    (diff + HALF_TURN).rem_euclid(FULL_TURN) - HALF_TURN
}

/// Move `angle` by whole turns until it lies within 180 degrees of `reference`
///
/// An angle already within range is returned unchanged.
pub fn unwrap_near(angle: f32, reference: f32) -> f32 {
    let offset = angle - reference;
    if (-HALF_TURN..=HALF_TURN).contains(&offset) {
        return angle;
    }

    let shifted = angle - (offset / FULL_TURN).round() * FULL_TURN;
    if (-HALF_TURN..=HALF_TURN).contains(&(shifted - reference)) {
        shifted
    } else {
        // Whole-turn count too large to represent exactly
        reference + wrap_difference(offset)
    }
}
