//! Reduces a multi-hit wall sweep to a single surface decision.
//!
//! Averaging the hits of a capsule sweep trades precision for stability: edges and corners
//! produce several slightly different normals, and their mean does not jitter across seams the
//! way a single trace would.

use glam::{DVec3, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::probe::ProbeHit;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceDecision {
    /// Mean of all contributing impact points.
    pub location: Vec3,
    /// Mean of all contributing impact normals, renormalized. Zero when the mean cancels out.
    pub normal: Vec3,
    /// Wall-climb intent: true whenever at least one hit contributed.
    pub climbable: bool,
}

impl SurfaceDecision {
    pub const NONE: Self = Self {
        location: Vec3::ZERO,
        normal: Vec3::ZERO,
        climbable: false,
    };

    /// False when the averaged normal degenerated to zero (e.g. exactly opposing hits).
    pub fn has_usable_normal(&self) -> bool {
        self.normal != Vec3::ZERO
    }

    /// Climbable and carrying a normal a frame can be built from.
    pub fn can_climb(&self) -> bool {
        self.climbable && self.has_usable_normal()
    }
}

pub fn classify(hits: &[ProbeHit]) -> SurfaceDecision {
    if hits.is_empty() {
        return SurfaceDecision::NONE;
    }

    let location_sum = canonical_sum(hits.iter().map(|hit| hit.impact_point).collect());
    let normal_sum = canonical_sum(hits.iter().map(|hit| hit.impact_normal).collect());

    SurfaceDecision {
        location: (location_sum / hits.len() as f64).as_vec3(),
        normal: normal_sum.normalize_or_zero().as_vec3(),
        climbable: true,
    }
}

/// Sum in a fixed order so the result does not depend on the order hits were reported in.
fn canonical_sum(mut values: Vec<Vec3>) -> DVec3 {
    values.sort_unstable_by(|a, b| {
        a.x.total_cmp(&b.x)
            .then(a.y.total_cmp(&b.y))
            .then(a.z.total_cmp(&b.z))
    });
    values
        .iter()
        .fold(DVec3::ZERO, |sum, value| sum + value.as_dvec3())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::SurfaceId;

    #[test]
    fn empty_hits_give_no_decision() {
        assert_eq!(classify(&[]), SurfaceDecision::NONE);
        assert!(!classify(&[]).can_climb());
    }

    #[test]
    fn averages_points_and_normals() {
        let hits = [
            ProbeHit::blocking(Vec3::new(0.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), SurfaceId(1)),
            ProbeHit::blocking(Vec3::new(2.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0), SurfaceId(2)),
        ];
        let decision = classify(&hits);
        assert_eq!(decision.location, Vec3::new(1.0, 1.0, 0.0));
        let expected = Vec3::new(-1.0, -1.0, 0.0).normalize();
        assert!((decision.normal - expected).length() < 1e-6);
        assert!(decision.climbable);
    }

    #[test]
    fn fractional_hits_average_the_same_in_any_order() {
        let hits = [
            ProbeHit::blocking(
                Vec3::new(10.3, -4.7, 0.1),
                Vec3::new(-0.91, 0.13, 0.37),
                SurfaceId(1),
            ),
            ProbeHit::blocking(
                Vec3::new(9.9, 2.25, 1.7),
                Vec3::new(-0.77, 0.21, -0.6),
                SurfaceId(2),
            ),
            ProbeHit::blocking(
                Vec3::new(11.1, 0.3, -2.9),
                Vec3::new(-0.83, 0.05, 0.55),
                SurfaceId(3),
            ),
        ];
        let forward = classify(&hits);

        let mut reversed = hits;
        reversed.reverse();
        let backward = classify(&reversed);

        assert_eq!(
            forward.location.to_array().map(f32::to_bits),
            backward.location.to_array().map(f32::to_bits)
        );
        assert_eq!(
            forward.normal.to_array().map(f32::to_bits),
            backward.normal.to_array().map(f32::to_bits)
        );
    }

    #[test]
    fn opposing_normals_cancel_to_zero() {
        let hits = [
            ProbeHit::blocking(Vec3::X, Vec3::X, SurfaceId(1)),
            ProbeHit::blocking(-Vec3::X, -Vec3::X, SurfaceId(2)),
        ];
        let decision = classify(&hits);
        assert_eq!(decision.normal, Vec3::ZERO);
        assert!(decision.climbable);
        assert!(!decision.has_usable_normal());
        assert!(!decision.can_climb());
    }
}
