//! Bevy adapter for `spider-core`.
//!
//! Each entity carrying a [`SpiderController`] and a `Transform` is ticked once per schedule run.
//! The core works in its own agent-local axes (forward +X, up +Z); this crate converts to and
//! from Bevy's (forward -Z, up +Y) at the `Transform` boundary, so positions are shared and only
//! rotations are remapped.
//!
//! ## Scheduling
//!
//! Like other simulation logic, locomotion is best run in [`bevy_app::FixedUpdate`]. The fixed
//! timestep loop is driven by Bevy's time plugin(s), so the plugin defaults to
//! [`bevy_app::Update`]; opt in with [`SpiderLocomotionPlugin::in_fixed_update`].
//!
//! ## Features
//!
//! - `time`: `SpiderTick.dt_seconds` follows `Time::delta_secs()` when the resource exists.
//! - `trace`: every tick report is also written as a [`SpiderTraceEvent`].
//! - `physics`: entities with a [`physics::SpiderRapierBody`] probe the Rapier scene and move
//!   through `KinematicCharacterController`.
//! - `debug`: draws the wall capsule and ground ray with gizmos.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

use std::sync::Arc;

use bevy_app::{App, FixedUpdate, Plugin, Update};
use bevy_ecs::prelude::{Component, Entity, Query, Res, ResMut, Resource, SystemSet};
use bevy_ecs::schedule::IntoScheduleConfigs;
use bevy_transform::components::Transform;
use spider_core::glam::{Mat3, Quat, Vec3};
use spider_core::{
    ConfigError, LocomotionConfig, MovementIntent, Placement, SpiderLocomotion, SurfaceId,
    TickContext, TickReport, WorldQuery,
};

#[cfg(feature = "time")]
use bevy_time::Time;

#[cfg(feature = "trace")]
use bevy_ecs::event::EventWriter;
#[cfg(feature = "trace")]
use spider_tools::TickTrace;

#[cfg(feature = "physics")]
#[cfg_attr(docsrs, doc(cfg(feature = "physics")))]
pub mod physics;

#[cfg(feature = "debug")]
#[cfg_attr(docsrs, doc(cfg(feature = "debug")))]
pub mod debug;

/// Rotation taking agent-local axes onto Bevy-local axes (+X → -Z, +Y → -X, +Z → +Y).
fn bevy_from_agent() -> Quat {
    Quat::from_mat3(&Mat3::from_cols(Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y))
}

/// Agent orientation for a Bevy `Transform.rotation`.
pub fn agent_rotation(bevy_rotation: Quat) -> Quat {
    (bevy_rotation * bevy_from_agent()).normalize()
}

/// Bevy `Transform.rotation` for an agent orientation.
pub fn bevy_rotation(agent_rotation: Quat) -> Quat {
    (agent_rotation * bevy_from_agent().inverse()).normalize()
}

/// Default config for Bevy scenes: identical tunables, with world up along Bevy's +Y.
pub fn bevy_config() -> LocomotionConfig {
    LocomotionConfig::default().with_world_up(Vec3::Y)
}

/// Stable surface id for an entity, as reported in probe hits.
pub fn surface_id(entity: Entity) -> SurfaceId {
    SurfaceId(entity.to_bits())
}

#[derive(Debug, Clone)]
#[derive(Component)]
pub struct SpiderController(pub SpiderLocomotion);

impl SpiderController {
    pub fn new(config: LocomotionConfig) -> Result<Self, ConfigError> {
        SpiderLocomotion::new(config).map(Self)
    }
}

/// Walking request for the next tick, in agent-local axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Component)]
pub struct SpiderIntent(pub MovementIntent);

/// Report of the most recent tick. Add it to an entity to keep one.
#[derive(Debug, Clone, Default)]
#[derive(Component)]
pub struct SpiderLastReport(pub Option<TickReport>);

#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Resource)]
pub struct SpiderTick {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl Default for SpiderTick {
    fn default() -> Self {
        Self {
            tick: 0,
            dt_seconds: 1.0 / 60.0,
        }
    }
}

/// Collision backend for controllers that are not driven by the physics integration.
#[derive(Clone)]
#[derive(Resource)]
pub struct SpiderWorld(pub Arc<dyn WorldQuery + Send + Sync>);

impl SpiderWorld {
    pub fn new<W: WorldQuery + Send + Sync + 'static>(world: W) -> Self {
        Self(Arc::new(world))
    }
}

/// Bevy event emitted for every tick when `trace` is enabled.
#[cfg(feature = "trace")]
#[cfg_attr(docsrs, doc(cfg(feature = "trace")))]
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderTraceEvent {
    pub entity: Entity,
    pub trace: TickTrace,
}

#[cfg(feature = "trace")]
impl bevy_ecs::event::Event for SpiderTraceEvent {
    type Traversal = ();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiderSchedule {
    Update,
    FixedUpdate,
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SpiderSet {
    SyncIn,
    Locomotion,
    SyncOut,
}

/// [`Placement`] over a bare `Transform`: moves are applied in full.
pub struct TransformPlacement<'a> {
    pub transform: &'a mut Transform,
}

impl Placement for TransformPlacement<'_> {
    fn location(&self) -> Vec3 {
        self.transform.translation
    }

    fn orientation(&self) -> Quat {
        agent_rotation(self.transform.rotation)
    }

    fn move_with_sweep(&mut self, delta: Vec3, orientation: Quat) -> Vec3 {
        self.transform.translation += delta;
        self.transform.rotation = bevy_rotation(orientation);
        delta
    }
}

#[cfg(feature = "physics")]
type HostDriven = bevy_ecs::query::Without<physics::SpiderRapierBody>;
#[cfg(not(feature = "physics"))]
type HostDriven = ();

#[cfg(feature = "time")]
pub fn sync_tick_dt_from_bevy_time(time: Option<Res<Time>>, mut tick: ResMut<SpiderTick>) {
    let Some(time) = time else {
        return;
    };

    let dt = time.delta_secs();
    if dt.is_finite() && dt.is_sign_positive() {
        tick.dt_seconds = dt;
    }
}

/// Advances the tick counter; runs after every controller has ticked.
pub fn advance_spider_tick(mut tick: ResMut<SpiderTick>) {
    tick.tick = tick.tick.wrapping_add(1);
}

/// Ticks controllers against the [`SpiderWorld`] backend.
#[allow(clippy::type_complexity)]
pub fn tick_spiders(
    tick: Res<SpiderTick>,
    world: Option<Res<SpiderWorld>>,
    mut query: Query<
        (
            Entity,
            &mut SpiderController,
            Option<&SpiderIntent>,
            &mut Transform,
            Option<&mut SpiderLastReport>,
        ),
        HostDriven,
    >,
    #[cfg(feature = "trace")] mut writer: EventWriter<SpiderTraceEvent>,
) {
    let Some(world) = world else {
        if !query.is_empty() {
            tracing::trace!("no SpiderWorld resource; skipping locomotion");
        }
        return;
    };

    let ctx = TickContext::new(tick.tick, tick.dt_seconds);
    for (entity, mut controller, intent, mut transform, last) in query.iter_mut() {
        let intent = intent.map(|i| i.0).unwrap_or_default();
        let mut placement = TransformPlacement {
            transform: &mut *transform,
        };
        let report = controller.0.tick(&ctx, intent, world.0.as_ref(), &mut placement);

        #[cfg(feature = "trace")]
        writer.write(SpiderTraceEvent {
            entity,
            trace: TickTrace::from(&report),
        });
        #[cfg(not(feature = "trace"))]
        let _ = entity;

        if let Some(mut last) = last {
            last.0 = Some(report);
        }
    }
}

pub struct SpiderLocomotionPlugin {
    schedule: SpiderSchedule,
}

impl Default for SpiderLocomotionPlugin {
    fn default() -> Self {
        Self {
            schedule: SpiderSchedule::Update,
        }
    }
}

impl SpiderLocomotionPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_fixed_update(mut self) -> Self {
        self.schedule = SpiderSchedule::FixedUpdate;
        self
    }

    pub fn schedule(&self) -> SpiderSchedule {
        self.schedule
    }
}

impl Plugin for SpiderLocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpiderTick>();

        #[cfg(feature = "trace")]
        app.add_event::<SpiderTraceEvent>();

        #[cfg(feature = "debug")]
        app.init_resource::<debug::SpiderDebugConfig>();

        let systems = (
            #[cfg(feature = "time")]
            sync_tick_dt_from_bevy_time.in_set(SpiderSet::SyncIn),
            tick_spiders.in_set(SpiderSet::Locomotion),
            #[cfg(feature = "physics")]
            physics::tick_spiders_with_rapier.in_set(SpiderSet::Locomotion),
            advance_spider_tick.in_set(SpiderSet::SyncOut),
        );

        match self.schedule {
            SpiderSchedule::Update => {
                app.configure_sets(
                    Update,
                    (SpiderSet::SyncIn, SpiderSet::Locomotion, SpiderSet::SyncOut).chain(),
                );
                app.add_systems(Update, systems);
            }
            SpiderSchedule::FixedUpdate => {
                app.configure_sets(
                    FixedUpdate,
                    (SpiderSet::SyncIn, SpiderSet::Locomotion, SpiderSet::SyncOut).chain(),
                );
                app.add_systems(FixedUpdate, systems);
            }
        }

        #[cfg(feature = "debug")]
        app.add_systems(bevy_app::PostUpdate, debug::draw_spider_probes);
    }
}
