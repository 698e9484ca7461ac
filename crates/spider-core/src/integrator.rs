//! Commits a movement result: rotation is damped, translation is immediate.

use glam::{Quat, Vec3};

use crate::probe::Placement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseStep {
    /// Translation that was requested this tick.
    pub requested: Vec3,
    /// Translation the placement service actually applied.
    pub applied: Vec3,
    pub location: Vec3,
    pub orientation: Quat,
}

/// Slerp fraction for one tick. Never negative and never past the target.
pub fn blend_alpha(dt_seconds: f32, turn_rate: f32) -> f32 {
    let alpha = dt_seconds.max(0.0) * turn_rate.max(0.0);
    // An overflowing product still means "snap"; only 0 * inf has no direction.
    if alpha.is_nan() {
        0.0
    } else {
        alpha.min(1.0)
    }
}

/// Orientation after one tick of turning from `current` toward `target` (shortest arc).
pub fn blend_orientation(current: Quat, target: Quat, dt_seconds: f32, turn_rate: f32) -> Quat {
    let alpha = blend_alpha(dt_seconds, turn_rate);
    if alpha <= 0.0 {
        return current;
    }
    if alpha >= 1.0 {
        return target.normalize();
    }
    current.slerp(target, alpha).normalize()
}

/// Blend the orientation and commit the displacement through a single placement move.
pub fn integrate<P: Placement + ?Sized>(
    placement: &mut P,
    target: Quat,
    displacement: Vec3,
    dt_seconds: f32,
    turn_rate: f32,
) -> PoseStep {
    let orientation = blend_orientation(placement.orientation(), target, dt_seconds, turn_rate);
    let applied = placement.move_with_sweep(displacement, orientation);
    PoseStep {
        requested: displacement,
        applied,
        location: placement.location(),
        orientation: placement.orientation(),
    }
}
