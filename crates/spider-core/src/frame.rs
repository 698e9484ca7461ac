//! Orthonormal agent frames from a single surface normal.
//!
//! The new forward axis is `up × (ref_forward × ref_up)`: the previous forward re-projected onto
//! the plane perpendicular to the new up. Small normal changes therefore produce small heading
//! changes instead of snapping to a fixed reference axis.

use glam::{Mat3, Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this squared length a candidate forward axis is considered degenerate.
const DEGENERATE_LENGTH_SQUARED: f32 = 1e-8;

/// Agent basis. Local +X is forward, local +Y is right (`up × forward`), local +Z is up.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Frame {
    pub fn from_orientation(orientation: Quat) -> Self {
        Self {
            forward: orientation * Vec3::X,
            right: orientation * Vec3::Y,
            up: orientation * Vec3::Z,
        }
    }

    pub fn to_quat(&self) -> Quat {
        Quat::from_mat3(&Mat3::from_cols(self.forward, self.right, self.up)).normalize()
    }

    pub fn is_orthonormal(&self, epsilon: f32) -> bool {
        let unit = |v: Vec3| (v.length() - 1.0).abs() <= epsilon;
        unit(self.forward)
            && unit(self.right)
            && unit(self.up)
            && self.forward.dot(self.right).abs() <= epsilon
            && self.forward.dot(self.up).abs() <= epsilon
            && self.right.dot(self.up).abs() <= epsilon
    }

    pub fn is_finite(&self) -> bool {
        self.forward.is_finite() && self.right.is_finite() && self.up.is_finite()
    }
}

/// Builds twist-minimizing frames, falling back to `world_up` only when the agent's own axes
/// cannot define a heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBuilder {
    pub world_up: Vec3,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self { world_up: Vec3::Z }
    }
}

impl FrameBuilder {
    pub fn new(world_up: Vec3) -> Self {
        Self {
            world_up: world_up.try_normalize().unwrap_or(Vec3::Z),
        }
    }

    /// Build a frame whose up axis is `desired_up`.
    ///
    /// `reference_forward`/`reference_up` are the agent's current axes and only steer the
    /// heading. A non-normalizable `desired_up` keeps the reference up axis.
    pub fn build(&self, desired_up: Vec3, reference_forward: Vec3, reference_up: Vec3) -> Frame {
        let up = desired_up
            .try_normalize()
            .or_else(|| reference_up.try_normalize())
            .unwrap_or(self.world_up);

        let forward = up.cross(reference_forward.cross(reference_up));
        let forward = non_degenerate(forward)
            .or_else(|| project_onto_plane(reference_forward, up))
            .or_else(|| project_onto_plane(self.world_up, up))
            .unwrap_or_else(|| up.any_orthonormal_vector());

        let right = up.cross(forward).normalize();
        // Re-derive forward so near-degenerate cross products stay orthogonal to up.
        let forward = right.cross(up);
        Frame { forward, right, up }
    }

    /// Convenience over [`FrameBuilder::build`] taking the current orientation as reference.
    pub fn build_from(&self, desired_up: Vec3, current: Quat) -> Frame {
        let reference = Frame::from_orientation(current);
        self.build(desired_up, reference.forward, reference.up)
    }
}

fn non_degenerate(v: Vec3) -> Option<Vec3> {
    if v.length_squared() <= DEGENERATE_LENGTH_SQUARED {
        None
    } else {
        v.try_normalize()
    }
}

fn project_onto_plane(v: Vec3, normal: Vec3) -> Option<Vec3> {
    non_degenerate(v - normal * v.dot(normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn level_frame_keeps_heading() {
        let frame = FrameBuilder::default().build(Vec3::Z, Vec3::X, Vec3::Z);
        assert!((frame.forward - Vec3::X).length() < EPS);
        assert!((frame.right - Vec3::Y).length() < EPS);
        assert_eq!(frame.up, Vec3::Z);
        assert!(frame.is_orthonormal(EPS));
    }

    #[test]
    fn wall_frame_turns_forward_upward() {
        let frame = FrameBuilder::default().build(-Vec3::X, Vec3::X, Vec3::Z);
        assert!((frame.forward - Vec3::Z).length() < EPS);
        assert!(frame.is_orthonormal(EPS));
    }

    #[test]
    fn identity_orientation_round_trips() {
        let frame = Frame::from_orientation(Quat::IDENTITY);
        assert!(frame.to_quat().angle_between(Quat::IDENTITY) < 1e-4);
    }

    #[test]
    fn collinear_up_falls_back_to_projected_forward() {
        // New up is the agent's old right axis, so `ref_forward × ref_up` is parallel to it.
        let frame = FrameBuilder::default().build(Vec3::Y, Vec3::X, Vec3::Z);
        assert!(frame.is_finite());
        assert!(frame.is_orthonormal(EPS));
        assert!((frame.forward - Vec3::X).length() < EPS);
    }

    #[test]
    fn parallel_reference_axes_fall_back_to_world_up() {
        let frame = FrameBuilder::default().build(Vec3::X, Vec3::X, Vec3::X);
        assert!(frame.is_orthonormal(EPS));
        assert!((frame.forward - Vec3::Z).length() < EPS);
    }

    #[test]
    fn fully_degenerate_inputs_still_produce_a_basis() {
        let frame = FrameBuilder::default().build(Vec3::Z, Vec3::Z, Vec3::Z);
        assert!(frame.is_orthonormal(EPS));
    }

    #[test]
    fn zero_desired_up_keeps_reference_up() {
        let frame = FrameBuilder::default().build(Vec3::ZERO, Vec3::X, Vec3::Z);
        assert_eq!(frame.up, Vec3::Z);
        assert!(frame.is_orthonormal(EPS));
    }
}
