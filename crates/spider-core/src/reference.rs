//! Reference backends: an analytic world of finite rectangular panels and a sphere body moving
//! through it.
//!
//! These are intended for headless simulation, tests, and benchmarks. The capsule sweep is an
//! approximation (the capsule segment is tested against each panel at the sweep start and end),
//! which is sufficient for the one-unit sweeps the sampler issues.

use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::probe::{
    CapsuleSweep, CategoryMask, Placement, ProbeFilter, ProbeHit, RaySegment, SurfaceId,
    WorldQuery,
};

const PARALLEL_EPSILON: f32 = 1e-6;
const CONTACT_SKIN: f32 = 1e-3;
const MAX_SLIDES: usize = 3;

/// Two-sided finite rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Panel {
    pub id: SurfaceId,
    pub center: Vec3,
    pub normal: Vec3,
    /// First in-plane axis; the second is `normal × tangent`.
    pub tangent: Vec3,
    pub half_extents: Vec2,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: CategoryMask,
}

impl Panel {
    /// Build a panel, normalizing `normal` and orthogonalizing `tangent` against it.
    ///
    /// Returns `None` if the normal is degenerate.
    pub fn new(
        id: SurfaceId,
        center: Vec3,
        normal: Vec3,
        tangent: Vec3,
        half_extents: Vec2,
    ) -> Option<Self> {
        let normal = normal.try_normalize()?;
        let tangent = (tangent - normal * tangent.dot(normal))
            .try_normalize()
            .unwrap_or_else(|| normal.any_orthonormal_vector());
        Some(Self {
            id,
            center,
            normal,
            tangent,
            half_extents: half_extents.abs(),
            category: CategoryMask::ALL,
        })
    }

    pub fn with_category(mut self, category: CategoryMask) -> Self {
        self.category = category;
        self
    }

    pub fn bitangent(&self) -> Vec3 {
        self.normal.cross(self.tangent)
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.center)
    }

    /// Closest point on the rectangle to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = point - self.center;
        let u = local.dot(self.tangent).clamp(-self.half_extents.x, self.half_extents.x);
        let v = local
            .dot(self.bitangent())
            .clamp(-self.half_extents.y, self.half_extents.y);
        self.center + self.tangent * u + self.bitangent() * v
    }

    fn contains_in_plane(&self, point: Vec3, margin: f32) -> bool {
        let local = point - self.center;
        local.dot(self.tangent).abs() <= self.half_extents.x + margin
            && local.dot(self.bitangent()).abs() <= self.half_extents.y + margin
    }

    /// Face normal on the side `point` is on.
    fn facing_normal(&self, point: Vec3) -> Vec3 {
        if self.signed_distance(point) < 0.0 {
            -self.normal
        } else {
            self.normal
        }
    }

    fn ray_hit(&self, ray: &RaySegment) -> Option<(f32, ProbeHit)> {
        let dir = ray.end - ray.start;
        let denom = self.normal.dot(dir);
        if denom.abs() <= PARALLEL_EPSILON {
            return None;
        }
        let t = self.normal.dot(self.center - ray.start) / denom;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        let point = ray.start + dir * t;
        if !self.contains_in_plane(point, 0.0) {
            return None;
        }
        let normal = if denom > 0.0 { -self.normal } else { self.normal };
        Some((t, ProbeHit::blocking(point, normal, self.id)))
    }

    fn capsule_hit(
        &self,
        center: Vec3,
        axis: Vec3,
        segment_half: f32,
        radius: f32,
    ) -> Option<ProbeHit> {
        let a = center + axis * segment_half;
        let b = center - axis * segment_half;
        let (da, db) = (self.signed_distance(a), self.signed_distance(b));

        let nearest = if da * db <= 0.0 {
            // The segment crosses the plane.
            let t = if (da - db).abs() <= PARALLEL_EPSILON {
                0.5
            } else {
                da / (da - db)
            };
            a + (b - a) * t
        } else if da.abs() <= db.abs() {
            a
        } else {
            b
        };

        let impact = self.closest_point(nearest);
        if impact.distance(nearest) > radius {
            return None;
        }
        Some(ProbeHit::blocking(impact, self.facing_normal(center), self.id))
    }

    /// Earliest fraction of `delta` at which a sphere at `from` touches this panel.
    fn sphere_toi(&self, from: Vec3, delta: Vec3, radius: f32) -> Option<f32> {
        let s0 = self.signed_distance(from);
        let side = if s0 < 0.0 { -1.0 } else { 1.0 };
        let approach = -self.normal.dot(delta) * side;
        if approach <= PARALLEL_EPSILON {
            return None;
        }

        let gap = s0.abs() - radius;
        let t = if gap <= CONTACT_SKIN {
            0.0
        } else {
            gap / approach
        };
        if t > 1.0 {
            return None;
        }

        let contact = from + delta * t - self.normal * side * s0.abs().min(radius);
        if !self.contains_in_plane(contact, 0.0) {
            return None;
        }
        Some(t)
    }
}

/// Analytic world made of [`Panel`]s.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelWorld {
    pub panels: Vec<Panel>,
}

impl PanelWorld {
    pub fn new(panels: Vec<Panel>) -> Self {
        Self { panels }
    }

    pub fn push(&mut self, panel: Panel) {
        self.panels.push(panel);
    }

    fn accepted<'a>(&'a self, filter: &'a ProbeFilter) -> impl Iterator<Item = &'a Panel> + 'a {
        self.panels
            .iter()
            .filter(move |panel| filter.accepts(panel.id, panel.category))
    }
}

impl WorldQuery for PanelWorld {
    fn sweep_capsule_multi(&self, sweep: &CapsuleSweep, filter: &ProbeFilter) -> Vec<ProbeHit> {
        let axis = sweep.axis();
        let half = sweep.segment_half_length();
        self.accepted(filter)
            .filter_map(|panel| {
                panel
                    .capsule_hit(sweep.start, axis, half, sweep.radius)
                    .or_else(|| panel.capsule_hit(sweep.end, axis, half, sweep.radius))
            })
            .collect()
    }

    fn trace_ray_single(&self, ray: &RaySegment, filter: &ProbeFilter) -> Option<ProbeHit> {
        self.accepted(filter)
            .filter_map(|panel| panel.ray_hit(ray))
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, hit)| hit)
    }
}

/// Sphere-shaped agent body moving through a [`PanelWorld`].
///
/// With no blockers every move is applied in full. With blockers, translation stops at contact
/// (and optionally slides along the contact plane); the orientation is always applied.
#[derive(Debug, Clone)]
pub struct SimBody {
    pub location: Vec3,
    pub orientation: Quat,
    pub collision_radius: f32,
    pub slide: bool,
    blockers: Option<Arc<PanelWorld>>,
}

impl SimBody {
    pub fn new(location: Vec3, orientation: Quat, collision_radius: f32) -> Self {
        Self {
            location,
            orientation,
            collision_radius: collision_radius.max(0.0),
            slide: false,
            blockers: None,
        }
    }

    pub fn with_blockers(mut self, world: Arc<PanelWorld>) -> Self {
        self.blockers = Some(world);
        self
    }

    pub fn with_slide(mut self, slide: bool) -> Self {
        self.slide = slide;
        self
    }

    fn earliest_block(&self, world: &PanelWorld, from: Vec3, delta: Vec3) -> Option<(f32, Vec3)> {
        world
            .panels
            .iter()
            .filter_map(|panel| {
                panel
                    .sphere_toi(from, delta, self.collision_radius)
                    .map(|t| (t, panel.facing_normal(from)))
            })
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
    }
}

impl Placement for SimBody {
    fn location(&self) -> Vec3 {
        self.location
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn move_with_sweep(&mut self, delta: Vec3, orientation: Quat) -> Vec3 {
        self.orientation = orientation;
        let Some(world) = self.blockers.clone() else {
            self.location += delta;
            return delta;
        };

        let start = self.location;
        let mut remaining = delta;
        let passes = if self.slide { MAX_SLIDES } else { 1 };
        for _ in 0..passes {
            if remaining.length_squared() <= f32::EPSILON {
                break;
            }
            match self.earliest_block(&world, self.location, remaining) {
                None => {
                    self.location += remaining;
                    break;
                }
                Some((t, normal)) => {
                    self.location += remaining * t;
                    let rest = remaining * (1.0 - t);
                    remaining = rest - normal * rest.dot(normal);
                }
            }
        }
        self.location - start
    }
}
