use std::sync::Arc;

use spider_core::glam::{EulerRot, Quat, Vec2, Vec3};
use spider_core::{
    blend_orientation, integrate, Panel, PanelWorld, Placement, SimBody, SurfaceId,
};

use proptest::prelude::*;

fn arb_orientation() -> impl Strategy<Value = Quat> {
    (-3.1f32..3.1, -1.5f32..1.5, -3.1f32..3.1)
        .prop_map(|(yaw, pitch, roll)| Quat::from_euler(EulerRot::ZYX, yaw, pitch, roll))
}

#[test]
fn blocked_translation_still_rotates() {
    let floor = Panel::new(SurfaceId(1), Vec3::ZERO, Vec3::Z, Vec3::X, Vec2::splat(500.0))
        .expect("valid panel");
    let world = Arc::new(PanelWorld::new(vec![floor]));
    let mut body =
        SimBody::new(Vec3::new(0.0, 0.0, 10.0), Quat::IDENTITY, 10.0).with_blockers(world);

    let target = Quat::from_rotation_z(1.0);
    let step = integrate(&mut body, target, Vec3::new(0.0, 0.0, -5.0), 0.05, 8.0);

    assert!(step.applied.length() < 1e-4);
    assert_eq!(step.requested, Vec3::new(0.0, 0.0, -5.0));
    assert!(body.orientation().angle_between(Quat::IDENTITY) > 0.1);
    assert_eq!(step.orientation, body.orientation());
}

#[test]
fn zero_dt_commits_translation_without_turning() {
    let mut body = SimBody::new(Vec3::ZERO, Quat::IDENTITY, 1.0);
    let step = integrate(&mut body, Quat::from_rotation_x(1.0), Vec3::X, 0.0, 8.0);
    assert_eq!(step.applied, Vec3::X);
    assert_eq!(step.location, Vec3::X);
    assert_eq!(step.orientation, Quat::IDENTITY);
}

proptest! {
    #[test]
    fn turning_never_moves_away_or_overshoots(
        current in arb_orientation(),
        target in arb_orientation(),
        dt in 0.0f32..0.5,
        rate in 0.0f32..20.0,
    ) {
        let mut orientation = current;
        let mut remaining = orientation.angle_between(target);
        for _ in 0..16 {
            orientation = blend_orientation(orientation, target, dt, rate);
            let next = orientation.angle_between(target);
            prop_assert!(next <= remaining + 2e-3, "{next} > {remaining}");
            remaining = next;
        }
    }

    #[test]
    fn single_step_lands_between_current_and_target(
        current in arb_orientation(),
        target in arb_orientation(),
        dt in 0.0f32..0.5,
        rate in 0.0f32..20.0,
    ) {
        let start = current.angle_between(target);
        let blended = blend_orientation(current, target, dt, rate);
        let travelled = current.angle_between(blended);
        let left = blended.angle_between(target);
        prop_assert!(travelled <= start + 2e-3);
        prop_assert!((travelled + left - start).abs() < 5e-3);
    }
}
