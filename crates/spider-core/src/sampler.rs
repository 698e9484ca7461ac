//! Per-tick wall and ground probes.

use glam::{Quat, Vec3};

use crate::probe::{
    CapsuleSweep, ProbeFilter, ProbeHit, ProbeShape, RaySegment, SurfaceId, WorldQuery,
};

/// Hits returned by this tick's forward wall sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallSample {
    pub hits: Vec<ProbeHit>,
}

impl WallSample {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether `surface` contributed at least one hit this tick.
    pub fn contains_surface(&self, surface: SurfaceId) -> bool {
        self.hits.iter().any(|hit| hit.surface == surface)
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }
}

/// Capsule geometry for the wall sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallProbe {
    pub radius: f32,
    pub half_height: f32,
    /// Distance ahead of the agent where the sweep starts.
    pub offset: f32,
}

/// Ray geometry for the ground trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    pub forward_offset: f32,
    pub distance: f32,
}

/// Issues the wall and ground probes against a [`WorldQuery`].
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSampler {
    pub filter: ProbeFilter,
    pub wall: WallProbe,
    pub ground: GroundProbe,
}

impl SurfaceSampler {
    pub fn new(filter: ProbeFilter, wall: WallProbe, ground: GroundProbe) -> Self {
        Self {
            filter,
            wall,
            ground,
        }
    }

    /// The capsule sweep starts `offset` ahead of `location` and ends one forward unit further.
    pub fn wall_sweep(&self, location: Vec3, forward: Vec3, orientation: Quat) -> CapsuleSweep {
        let start = location + forward * self.wall.offset;
        CapsuleSweep {
            start,
            end: start + forward,
            radius: self.wall.radius,
            half_height: self.wall.half_height,
            orientation,
        }
    }

    /// The ground ray runs from `distance` above to `distance` below a point `forward_offset`
    /// ahead of `location`.
    pub fn ground_ray(&self, location: Vec3, forward: Vec3, up: Vec3) -> RaySegment {
        let base = location + forward * self.ground.forward_offset;
        let span = up * self.ground.distance;
        RaySegment::new(base + span, base - span)
    }

    /// Collect every wall hit into `out` (cleared first). An empty result is a normal outcome.
    pub fn sample_wall_surfaces_into<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        location: Vec3,
        orientation: Quat,
        out: &mut WallSample,
    ) -> CapsuleSweep {
        out.clear();
        let forward = orientation * Vec3::X;
        let sweep = self.wall_sweep(location, forward, orientation);
        if !self.filter_usable() {
            return sweep;
        }

        out.hits.extend(world.sweep_capsule_multi(&sweep, &self.filter));
        tracing::trace!(hits = out.hits.len(), "wall sweep");
        sweep
    }

    pub fn sample_wall_surfaces<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        location: Vec3,
        orientation: Quat,
    ) -> WallSample {
        let mut out = WallSample::default();
        self.sample_wall_surfaces_into(world, location, orientation, &mut out);
        out
    }

    /// Closest blocking ground hit, if any.
    pub fn sample_ground<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        location: Vec3,
        orientation: Quat,
    ) -> (RaySegment, Option<ProbeHit>) {
        let forward = orientation * Vec3::X;
        let up = orientation * Vec3::Z;
        let ray = self.ground_ray(location, forward, up);
        if !self.filter_usable() {
            return (ray, None);
        }

        let hit = world
            .trace_ray_single(&ray, &self.filter)
            .filter(|hit| hit.blocking);
        tracing::trace!(grounded = hit.is_some(), "ground trace");
        (ray, hit)
    }

    fn filter_usable(&self) -> bool {
        if self.filter.is_valid() {
            return true;
        }
        tracing::warn!("probe filter has no object categories; treating as no hits");
        false
    }
}

pub(crate) fn capsule_shape(sweep: &CapsuleSweep, hit_count: usize) -> ProbeShape {
    ProbeShape::Capsule {
        start: sweep.start,
        end: sweep.end,
        radius: sweep.radius,
        half_height: sweep.half_height,
        orientation: sweep.orientation,
        hit_count: hit_count as u32,
    }
}

pub(crate) fn ray_shape(ray: &RaySegment, hit: Option<&ProbeHit>) -> ProbeShape {
    ProbeShape::Ray {
        start: ray.start,
        end: ray.end,
        hit: hit.map(|h| h.impact_point),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::probe::CategoryMask;

    #[derive(Default)]
    struct Recorder {
        sweeps: RefCell<Vec<CapsuleSweep>>,
        rays: RefCell<Vec<RaySegment>>,
        ground: Option<ProbeHit>,
    }

    impl WorldQuery for Recorder {
        fn sweep_capsule_multi(
            &self,
            sweep: &CapsuleSweep,
            _filter: &ProbeFilter,
        ) -> Vec<ProbeHit> {
            self.sweeps.borrow_mut().push(*sweep);
            vec![ProbeHit::blocking(Vec3::X, -Vec3::X, SurfaceId(3))]
        }

        fn trace_ray_single(&self, ray: &RaySegment, _filter: &ProbeFilter) -> Option<ProbeHit> {
            self.rays.borrow_mut().push(*ray);
            self.ground
        }
    }

    fn sampler(categories: CategoryMask) -> SurfaceSampler {
        SurfaceSampler::new(
            ProbeFilter::new(categories),
            WallProbe {
                radius: 50.0,
                half_height: 72.0,
                offset: 30.0,
            },
            GroundProbe {
                forward_offset: 30.0,
                distance: 100.0,
            },
        )
    }

    #[test]
    fn wall_sweep_starts_ahead_and_spans_one_unit() {
        let world = Recorder::default();
        let sample = sampler(CategoryMask::ALL).sample_wall_surfaces(
            &world,
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
        );
        let sweeps = world.sweeps.borrow();
        assert_eq!(sweeps[0].start, Vec3::new(31.0, 2.0, 3.0));
        assert_eq!(sweeps[0].end, Vec3::new(32.0, 2.0, 3.0));
        assert!(sample.contains_surface(SurfaceId(3)));
        assert!(!sample.contains_surface(SurfaceId(4)));
    }

    #[test]
    fn ground_ray_spans_above_and_below() {
        let world = Recorder::default();
        let (ray, hit) =
            sampler(CategoryMask::ALL).sample_ground(&world, Vec3::ZERO, Quat::IDENTITY);
        assert!(hit.is_none());
        assert_eq!(ray.start, Vec3::new(30.0, 0.0, 100.0));
        assert_eq!(ray.end, Vec3::new(30.0, 0.0, -100.0));
        assert_eq!(world.rays.borrow().len(), 1);
    }

    #[test]
    fn non_blocking_ground_hit_is_ignored() {
        let world = Recorder {
            ground: Some(ProbeHit {
                impact_point: Vec3::ZERO,
                impact_normal: Vec3::Z,
                blocking: false,
                surface: SurfaceId(1),
            }),
            ..Default::default()
        };
        let (_, hit) = sampler(CategoryMask::ALL).sample_ground(&world, Vec3::ZERO, Quat::IDENTITY);
        assert!(hit.is_none());
    }

    #[test]
    fn invalid_filter_skips_queries() {
        let world = Recorder::default();
        let s = sampler(CategoryMask::NONE);
        assert!(s.sample_wall_surfaces(&world, Vec3::ZERO, Quat::IDENTITY).is_empty());
        assert!(s.sample_ground(&world, Vec3::ZERO, Quat::IDENTITY).1.is_none());
        assert!(world.sweeps.borrow().is_empty());
        assert!(world.rays.borrow().is_empty());
    }
}
