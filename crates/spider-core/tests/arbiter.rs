use spider_core::glam::{Quat, Vec3};
use spider_core::{
    classify, FrameBuilder, LocomotionMode, ModeArbiter, ProbeHit, SurfaceDecision, SurfaceId,
};

fn arbiter() -> ModeArbiter {
    ModeArbiter::new(FrameBuilder::default(), 3.0, 10.0)
}

fn ground() -> ProbeHit {
    ProbeHit::blocking(Vec3::new(30.0, 0.0, -40.0), Vec3::Z, SurfaceId(1))
}

fn wall() -> SurfaceDecision {
    classify(&[ProbeHit::blocking(
        Vec3::new(80.0, 0.0, 0.0),
        -Vec3::X,
        SurfaceId(2),
    )])
}

#[test]
fn climbing_overrides_grounded_exactly() {
    let arbiter = arbiter();
    let orientation = Quat::from_rotation_z(0.2);
    let location = Vec3::new(1.0, 2.0, 3.0);

    let arbitrated = arbiter.arbitrate(location, orientation, Some(&ground()), &wall());
    let climbing = arbiter.climbing(location, orientation, &wall());

    assert_eq!(arbitrated, climbing);
    assert_eq!(arbitrated.mode, LocomotionMode::Climbing);
}

#[test]
fn climbing_without_ground_still_climbs() {
    let result = arbiter().arbitrate(Vec3::ZERO, Quat::IDENTITY, None, &wall());
    assert_eq!(result.mode, LocomotionMode::Climbing);
    assert!((result.displacement - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
    let frame = result.frame.expect("climbing builds a frame");
    assert!((frame.up + Vec3::X).length() < 1e-5);
}

#[test]
fn grounded_matches_grounded_output() {
    let arbiter = arbiter();
    let orientation = Quat::from_rotation_x(0.1);
    let arbitrated =
        arbiter.arbitrate(Vec3::ZERO, orientation, Some(&ground()), &SurfaceDecision::NONE);
    assert_eq!(arbitrated, arbiter.grounded(orientation, &ground()));
}

#[test]
fn falls_through_to_falling() {
    let arbiter = arbiter();
    let orientation = Quat::from_rotation_y(0.7);
    let result = arbiter.arbitrate(Vec3::ZERO, orientation, None, &SurfaceDecision::NONE);

    assert_eq!(result, arbiter.falling(orientation));
    assert_eq!(result.mode, LocomotionMode::Falling);
    assert_eq!(result.target_orientation, orientation);
    let expected = -(orientation * Vec3::Z) * 3.0;
    assert!((result.displacement - expected).length() < 1e-5);
}

#[test]
fn degenerate_wall_without_ground_falls() {
    let wall = classify(&[
        ProbeHit::blocking(Vec3::X, Vec3::X, SurfaceId(1)),
        ProbeHit::blocking(-Vec3::X, -Vec3::X, SurfaceId(2)),
    ]);
    assert!(wall.climbable);
    let result = arbiter().arbitrate(Vec3::ZERO, Quat::IDENTITY, None, &wall);
    assert_eq!(result.mode, LocomotionMode::Falling);
}

#[test]
fn modes_are_recomputed_every_call() {
    let arbiter = arbiter();
    let climbing = arbiter.arbitrate(Vec3::ZERO, Quat::IDENTITY, Some(&ground()), &wall());
    let grounded =
        arbiter.arbitrate(Vec3::ZERO, Quat::IDENTITY, Some(&ground()), &SurfaceDecision::NONE);
    assert_eq!(climbing.mode, LocomotionMode::Climbing);
    assert_eq!(grounded.mode, LocomotionMode::Grounded);
}
