use spider_core::glam::{Quat, Vec3};
use spider_core::{
    LocomotionConfig, LocomotionMode, MovementIntent, PanelWorld, SimBody, SpiderLocomotion,
    TickContext,
};
use spider_tools::{
    ModeTransition, NullTraceSink, TickTrace, TraceLog, TraceSink, VecTraceSink,
};

fn trace(tick: u64, mode: LocomotionMode) -> TickTrace {
    TickTrace {
        tick,
        mode,
        location: Vec3::ZERO,
        orientation: Quat::IDENTITY,
        walk_applied: Vec3::ZERO,
        displacement: Vec3::ZERO,
        applied: Vec3::ZERO,
        wall_hits: 0,
        grounded: mode == LocomotionMode::Grounded,
        climbable: mode == LocomotionMode::Climbing,
        surface_normal: Vec3::ZERO,
    }
}

fn sample_log() -> TraceLog {
    let mut log = TraceLog::default();
    for (tick, mode) in [
        (0, LocomotionMode::Falling),
        (1, LocomotionMode::Falling),
        (2, LocomotionMode::Grounded),
        (3, LocomotionMode::Grounded),
        (4, LocomotionMode::Climbing),
        (5, LocomotionMode::Grounded),
    ] {
        log.push(trace(tick, mode));
    }
    log
}

#[test]
fn mode_counts_tally_each_mode() {
    let counts = sample_log().mode_counts();
    assert_eq!(counts.get(&LocomotionMode::Falling), Some(&2));
    assert_eq!(counts.get(&LocomotionMode::Grounded), Some(&3));
    assert_eq!(counts.get(&LocomotionMode::Climbing), Some(&1));
}

#[test]
fn transitions_are_reported_at_the_new_tick() {
    let transitions = sample_log().transitions();
    assert_eq!(
        transitions,
        vec![
            ModeTransition {
                tick: 2,
                from: LocomotionMode::Falling,
                to: LocomotionMode::Grounded,
            },
            ModeTransition {
                tick: 4,
                from: LocomotionMode::Grounded,
                to: LocomotionMode::Climbing,
            },
            ModeTransition {
                tick: 5,
                from: LocomotionMode::Climbing,
                to: LocomotionMode::Grounded,
            },
        ]
    );
}

#[test]
fn empty_log_has_no_transitions() {
    let log = TraceLog::default();
    assert!(log.is_empty());
    assert!(log.transitions().is_empty());
    assert!(log.mode_counts().is_empty());
}

#[test]
fn sinks_collect_controller_reports() {
    let mut spider = SpiderLocomotion::new(LocomotionConfig::default()).unwrap();
    let world = PanelWorld::default();
    let mut body = SimBody::new(Vec3::ZERO, Quat::IDENTITY, 10.0);

    let mut sink = VecTraceSink::default();
    let mut null = NullTraceSink;
    let mut boxed: Box<dyn TraceSink> = Box::new(TraceLog::default());

    let mut ctx = TickContext::new(0, 0.1);
    for _ in 0..3 {
        let report = spider.tick(&ctx, MovementIntent::IDLE, &world, &mut body);
        let record = TickTrace::from(&report);
        sink.emit(&record).unwrap();
        null.emit(&record).unwrap();
        boxed.emit(&record).unwrap();
        ctx = ctx.next();
    }

    assert_eq!(sink.traces.len(), 3);
    assert!(sink.traces.iter().all(|t| t.mode == LocomotionMode::Falling));
    assert_eq!(sink.traces[2].tick, 2);
    assert!((sink.traces[2].location - Vec3::new(0.0, 0.0, -9.0)).length() < 1e-4);
    assert_eq!(sink.traces[0].up(), Vec3::Z);
    boxed.flush().unwrap();
}
