//! Per-tick locomotion mode selection.
//!
//! The mode is re-derived from this tick's probes alone; nothing about the previous mode is
//! stored. Priority is Climbing > Grounded > Falling: the grounded result is computed first and
//! then replaced wholesale when a climbable wall is present, so hugging a floor/wall seam always
//! climbs.

use std::fmt;

use glam::{Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::classifier::SurfaceDecision;
use crate::frame::{Frame, FrameBuilder};
use crate::probe::ProbeHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LocomotionMode {
    Grounded,
    Climbing,
    Falling,
}

impl LocomotionMode {
    pub const ALL: [Self; 3] = [Self::Grounded, Self::Climbing, Self::Falling];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::Climbing => "climbing",
            Self::Falling => "falling",
        }
    }
}

impl fmt::Display for LocomotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Raw displacement and target orientation for the selected mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementResult {
    pub mode: LocomotionMode,
    pub displacement: Vec3,
    pub target_orientation: Quat,
    /// Frame the target orientation was built from; `None` while falling.
    pub frame: Option<Frame>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeArbiter {
    pub frames: FrameBuilder,
    pub gravity_factor: f32,
    pub climb_pull: f32,
}

impl ModeArbiter {
    pub fn new(frames: FrameBuilder, gravity_factor: f32, climb_pull: f32) -> Self {
        Self {
            frames,
            gravity_factor,
            climb_pull,
        }
    }

    pub fn arbitrate(
        &self,
        location: Vec3,
        orientation: Quat,
        ground: Option<&ProbeHit>,
        wall: &SurfaceDecision,
    ) -> MovementResult {
        let mut selected = ground.map(|hit| self.grounded(orientation, hit));

        if wall.can_climb() {
            selected = Some(self.climbing(location, orientation, wall));
        } else if wall.climbable {
            tracing::debug!("wall normals cancelled out; ignoring climb intent");
        }

        selected.unwrap_or_else(|| self.falling(orientation))
    }

    /// Adhere to the ground: bias along the inverted contact normal.
    pub fn grounded(&self, orientation: Quat, ground: &ProbeHit) -> MovementResult {
        let frame = self.frames.build_from(ground.impact_normal, orientation);
        MovementResult {
            mode: LocomotionMode::Grounded,
            displacement: -ground.impact_normal * self.gravity_factor,
            target_orientation: frame.to_quat(),
            frame: Some(frame),
        }
    }

    /// Pull toward the averaged wall contact and align up with the wall normal.
    pub fn climbing(
        &self,
        location: Vec3,
        orientation: Quat,
        wall: &SurfaceDecision,
    ) -> MovementResult {
        let frame = self.frames.build_from(wall.normal, orientation);
        let toward = (wall.location - location).normalize_or_zero();
        MovementResult {
            mode: LocomotionMode::Climbing,
            displacement: toward * self.climb_pull,
            target_orientation: frame.to_quat(),
            frame: Some(frame),
        }
    }

    /// Keep the current orientation and drift along the agent's own down axis.
    pub fn falling(&self, orientation: Quat) -> MovementResult {
        let up = orientation * Vec3::Z;
        MovementResult {
            mode: LocomotionMode::Falling,
            displacement: -up * self.gravity_factor,
            target_orientation: orientation,
            frame: None,
        }
    }
}
