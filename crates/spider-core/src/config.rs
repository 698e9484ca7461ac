//! Tunable locomotion parameters.
//!
//! Values are read-only while ticking. Defaults match a creature roughly one metre across in
//! centimetre units.

use glam::Vec3;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::probe::{CategoryMask, ProbeFilter, SurfaceId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    NegativeOrNonFinite { field: &'static str, value: f32 },

    #[error("probe_half_height ({half_height}) must be at least probe_radius ({radius})")]
    HalfHeightBelowRadius { half_height: f32, radius: f32 },

    #[error("world_up must be a non-zero finite vector")]
    DegenerateWorldUp,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocomotionConfig {
    /// Radius of the forward wall-detection capsule.
    pub probe_radius: f32,
    /// Half height of the wall-detection capsule (caps included).
    pub probe_half_height: f32,
    /// Distance ahead of the agent where the wall sweep starts.
    pub wall_trace_start_offset: f32,
    /// Distance ahead of the agent where the ground ray is cast.
    pub ground_trace_forward_offset: f32,
    /// The ground ray spans this far above and below the agent.
    pub ground_trace_distance: f32,
    /// Magnitude of the adhesion/fall bias applied every tick.
    pub gravity_factor: f32,
    /// Magnitude of the pull toward the wall contact while climbing.
    pub climb_pull: f32,
    /// Reorientation rate; the slerp fraction per tick is `dt * turn_rate`.
    pub turn_rate: f32,
    /// Walking speed for a unit-length movement intent (units per second).
    pub max_speed: f32,
    /// Record probe shapes in each tick report.
    pub debug_draw: bool,
    /// Object categories the probes may hit.
    pub surface_categories: CategoryMask,
    /// Last-resort reference axis for degenerate frames.
    pub world_up: Vec3,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            probe_radius: 50.0,
            probe_half_height: 72.0,
            wall_trace_start_offset: 30.0,
            ground_trace_forward_offset: 30.0,
            ground_trace_distance: 100.0,
            gravity_factor: 3.0,
            climb_pull: 10.0,
            turn_rate: 8.0,
            max_speed: 1200.0,
            debug_draw: false,
            surface_categories: CategoryMask::ALL,
            world_up: Vec3::Z,
        }
    }
}

impl LocomotionConfig {
    /// Check geometric preconditions. A malformed category filter is not an error here; the
    /// sampler reports it as a warning and treats it as "no hits".
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("probe_radius", self.probe_radius),
            ("probe_half_height", self.probe_half_height),
            ("wall_trace_start_offset", self.wall_trace_start_offset),
            ("ground_trace_forward_offset", self.ground_trace_forward_offset),
            ("ground_trace_distance", self.ground_trace_distance),
            ("gravity_factor", self.gravity_factor),
            ("climb_pull", self.climb_pull),
            ("turn_rate", self.turn_rate),
            ("max_speed", self.max_speed),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeOrNonFinite { field, value });
            }
        }

        if self.probe_half_height < self.probe_radius {
            return Err(ConfigError::HalfHeightBelowRadius {
                half_height: self.probe_half_height,
                radius: self.probe_radius,
            });
        }

        if self.world_up.try_normalize().is_none() {
            return Err(ConfigError::DegenerateWorldUp);
        }

        Ok(())
    }

    /// Probe filter for an agent whose own surface is `own_surface`.
    pub fn probe_filter(&self, own_surface: Option<SurfaceId>) -> ProbeFilter {
        let filter = ProbeFilter::new(self.surface_categories);
        match own_surface {
            Some(id) => filter.ignoring(id),
            None => filter,
        }
    }

    pub fn with_debug_draw(mut self, enable: bool) -> Self {
        self.debug_draw = enable;
        self
    }

    pub fn with_world_up(mut self, world_up: Vec3) -> Self {
        self.world_up = world_up;
        self
    }

    pub fn with_surface_categories(mut self, categories: CategoryMask) -> Self {
        self.surface_categories = categories;
        self
    }
}
