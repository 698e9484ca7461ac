//! Geometric probe contracts.
//!
//! The core never performs collision queries itself. Hosts implement [`WorldQuery`] (shape sweeps
//! and ray traces) and [`Placement`] (committing a move against the agent transform); the core
//! only consumes the hit records they return.

use std::sync::Arc;

use glam::{Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identity of the surface (collider/component) that produced a hit.
///
/// Only compared for equality and membership; never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceId(pub u64);

/// Bit set of collidable object categories a probe is allowed to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for CategoryMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Query filter shared by both probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeFilter {
    pub categories: CategoryMask,
    /// The agent's own surface, excluded from results.
    pub ignore: Option<SurfaceId>,
}

impl ProbeFilter {
    pub fn new(categories: CategoryMask) -> Self {
        Self {
            categories,
            ignore: None,
        }
    }

    pub fn ignoring(mut self, surface: SurfaceId) -> Self {
        self.ignore = Some(surface);
        self
    }

    /// A filter with no categories can never match anything and is treated as malformed.
    pub fn is_valid(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Whether a surface of `category` with identity `surface` passes this filter.
    pub fn accepts(&self, surface: SurfaceId, category: CategoryMask) -> bool {
        self.categories.intersects(category) && self.ignore != Some(surface)
    }
}

/// A single probe result. Created fresh every tick and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeHit {
    pub impact_point: Vec3,
    pub impact_normal: Vec3,
    pub blocking: bool,
    pub surface: SurfaceId,
}

impl ProbeHit {
    pub fn blocking(impact_point: Vec3, impact_normal: Vec3, surface: SurfaceId) -> Self {
        Self {
            impact_point,
            impact_normal,
            blocking: true,
            surface,
        }
    }
}

/// Capsule swept from `start` to `end`. The capsule axis is the local +Z of `orientation`.
///
/// `half_height` includes the hemispherical caps, so it is never smaller than `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleSweep {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
    pub half_height: f32,
    pub orientation: Quat,
}

impl CapsuleSweep {
    /// World-space capsule axis (unit).
    pub fn axis(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    /// Half length of the inner segment (without the caps).
    pub fn segment_half_length(&self) -> f32 {
        (self.half_height - self.radius).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl RaySegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }
}

/// World-query service.
///
/// Implementations return empty results (never errors) when nothing is hit.
pub trait WorldQuery {
    /// Sweep a capsule and return every hit along the way (unordered).
    fn sweep_capsule_multi(&self, sweep: &CapsuleSweep, filter: &ProbeFilter) -> Vec<ProbeHit>;

    /// Trace a ray segment and return the closest hit, if any.
    fn trace_ray_single(&self, ray: &RaySegment, filter: &ProbeFilter) -> Option<ProbeHit>;
}

impl<T: WorldQuery + ?Sized> WorldQuery for &T {
    fn sweep_capsule_multi(&self, sweep: &CapsuleSweep, filter: &ProbeFilter) -> Vec<ProbeHit> {
        (**self).sweep_capsule_multi(sweep, filter)
    }

    fn trace_ray_single(&self, ray: &RaySegment, filter: &ProbeFilter) -> Option<ProbeHit> {
        (**self).trace_ray_single(ray, filter)
    }
}

impl<T: WorldQuery + ?Sized> WorldQuery for Arc<T> {
    fn sweep_capsule_multi(&self, sweep: &CapsuleSweep, filter: &ProbeFilter) -> Vec<ProbeHit> {
        (**self).sweep_capsule_multi(sweep, filter)
    }

    fn trace_ray_single(&self, ray: &RaySegment, filter: &ProbeFilter) -> Option<ProbeHit> {
        (**self).trace_ray_single(ray, filter)
    }
}

/// Placement service owning the agent's committed world transform.
pub trait Placement {
    fn location(&self) -> Vec3;

    fn orientation(&self) -> Quat;

    /// Move by `delta` while rotating to `orientation`.
    ///
    /// Returns the translation actually applied, which may be shorter than `delta` when blocked.
    /// The orientation is applied even when the translation is blocked.
    fn move_with_sweep(&mut self, delta: Vec3, orientation: Quat) -> Vec3;
}

/// Debug record of a probe issued this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProbeShape {
    Capsule {
        start: Vec3,
        end: Vec3,
        radius: f32,
        half_height: f32,
        orientation: Quat,
        hit_count: u32,
    },
    Ray {
        start: Vec3,
        end: Vec3,
        hit: Option<Vec3>,
    },
}
