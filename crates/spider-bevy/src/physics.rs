//! Rapier3D backends for the locomotion probes.
//!
//! [`RapierWorldQuery`] answers the wall sweep and ground trace against Rapier's query pipeline;
//! [`KinematicPlacement`] clips moves with a shape cast and hands the result to the entity's
//! `KinematicCharacterController`, which applies it during Rapier's own step.
//!
//! ```rust,ignore
//! commands.spawn((
//!     Transform::from_xyz(0.0, 1.0, 0.0),
//!     SpiderController::new(bevy_config())?,
//!     SpiderRapierBody::new(0.4),
//!     KinematicCharacterController::default(),
//!     Collider::ball(0.4),
//! ));
//! ```

use bevy_ecs::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy_transform::components::Transform;
use spider_core::glam::{Quat, Vec3};
use spider_core::{
    CapsuleSweep, Placement, ProbeFilter, ProbeHit, RaySegment, SurfaceId, TickContext,
    WorldQuery,
};

#[cfg(feature = "trace")]
use spider_tools::TickTrace;

use crate::{
    agent_rotation, bevy_rotation, surface_id, SpiderController, SpiderIntent, SpiderLastReport,
    SpiderTick,
};

/// Upper bound on distinct colliders collected by one capsule sweep.
pub const MAX_SWEEP_HITS: usize = 8;

/// Marks an entity as moved through Rapier instead of directly through its `Transform`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Component)]
pub struct SpiderRapierBody {
    /// Radius of the ball cast used to clip moves.
    pub radius: f32,
    /// Gap kept between the body and whatever blocked it.
    pub skin: f32,
}

impl SpiderRapierBody {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            skin: 0.01,
        }
    }
}

fn entity_for(surface: SurfaceId) -> Option<Entity> {
    Entity::try_from_bits(surface.0).ok()
}

fn query_filter<'a>(filter: &ProbeFilter) -> QueryFilter<'a> {
    let query = QueryFilter::default()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(filter.categories.bits()),
        ))
        .exclude_sensors();

    match filter.ignore.and_then(entity_for) {
        Some(entity) => query.exclude_collider(entity),
        None => query,
    }
}

/// Probe backend over a live Rapier context.
pub struct RapierWorldQuery<'a> {
    context: &'a RapierContext<'a>,
}

impl<'a> RapierWorldQuery<'a> {
    pub fn new(context: &'a RapierContext<'a>) -> Self {
        Self { context }
    }
}

impl WorldQuery for RapierWorldQuery<'_> {
    /// Repeats the shape cast, excluding colliders already hit, until nothing new is found.
    fn sweep_capsule_multi(&self, sweep: &CapsuleSweep, filter: &ProbeFilter) -> Vec<ProbeHit> {
        let shape = Collider::capsule_z(sweep.segment_half_length(), sweep.radius);
        let velocity = sweep.end - sweep.start;

        let mut seen: Vec<Entity> = Vec::new();
        let mut hits = Vec::new();
        while seen.len() < MAX_SWEEP_HITS {
            let options = ShapeCastOptions {
                max_time_of_impact: 1.0,
                stop_at_penetration: true,
                ..Default::default()
            };
            let unseen = |entity: Entity| !seen.contains(&entity);
            let cast = self.context.cast_shape(
                sweep.start,
                sweep.orientation,
                velocity,
                &shape,
                options,
                query_filter(filter).predicate(&unseen),
            );
            let Some((entity, hit)) = cast else {
                break;
            };

            let center = sweep.start + velocity * hit.time_of_impact;
            let normal = hit
                .details
                .map(|d| d.normal1)
                .and_then(Vec3::try_normalize)
                .unwrap_or(-velocity.normalize_or_zero());
            // Contact on the capsule surface facing the hit collider.
            let point = center - normal * sweep.radius;

            seen.push(entity);
            hits.push(ProbeHit::blocking(point, normal, surface_id(entity)));
        }

        tracing::trace!(hits = hits.len(), "rapier capsule sweep");
        hits
    }

    fn trace_ray_single(&self, ray: &RaySegment, filter: &ProbeFilter) -> Option<ProbeHit> {
        let length = ray.length();
        let direction = (ray.end - ray.start).try_normalize()?;

        self.context
            .cast_ray_and_get_normal(ray.start, direction, length, true, query_filter(filter))
            .map(|(entity, intersection)| {
                ProbeHit::blocking(
                    ray.start + direction * intersection.time_of_impact,
                    intersection.normal,
                    surface_id(entity),
                )
            })
    }
}

/// Placement that clips each move with a ball cast and accumulates it for the character
/// controller.
pub struct KinematicPlacement<'a> {
    context: &'a RapierContext<'a>,
    entity: Entity,
    body: SpiderRapierBody,
    location: Vec3,
    orientation: Quat,
    pending: Vec3,
}

impl<'a> KinematicPlacement<'a> {
    pub fn new(
        context: &'a RapierContext<'a>,
        entity: Entity,
        body: SpiderRapierBody,
        transform: &Transform,
    ) -> Self {
        Self {
            context,
            entity,
            body,
            location: transform.translation,
            orientation: agent_rotation(transform.rotation),
            pending: Vec3::ZERO,
        }
    }

    /// Total translation to hand to the character controller this tick.
    pub fn pending(&self) -> Vec3 {
        self.pending
    }

    /// Bevy rotation to write back to the `Transform`.
    pub fn bevy_rotation(&self) -> Quat {
        bevy_rotation(self.orientation)
    }
}

impl Placement for KinematicPlacement<'_> {
    fn location(&self) -> Vec3 {
        self.location
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn move_with_sweep(&mut self, delta: Vec3, orientation: Quat) -> Vec3 {
        self.orientation = orientation;

        let length = delta.length();
        if length <= f32::EPSILON {
            return Vec3::ZERO;
        }
        let direction = delta / length;

        let shape = Collider::ball(self.body.radius);
        let options = ShapeCastOptions {
            max_time_of_impact: length,
            stop_at_penetration: false,
            ..Default::default()
        };
        let filter = QueryFilter::default()
            .exclude_sensors()
            .exclude_collider(self.entity);

        let travel = match self
            .context
            .cast_shape(self.location, Quat::IDENTITY, direction, &shape, options, filter)
        {
            Some((_, hit)) => (hit.time_of_impact - self.body.skin).clamp(0.0, length),
            None => length,
        };

        let applied = direction * travel;
        self.location += applied;
        self.pending += applied;
        applied
    }
}

/// Ticks controllers on [`SpiderRapierBody`] entities against the Rapier scene.
#[allow(clippy::type_complexity)]
pub fn tick_spiders_with_rapier(
    tick: Res<SpiderTick>,
    rapier: ReadRapierContext,
    mut query: Query<(
        Entity,
        &SpiderRapierBody,
        &mut SpiderController,
        Option<&SpiderIntent>,
        &mut Transform,
        &mut KinematicCharacterController,
        Option<&mut SpiderLastReport>,
    )>,
    #[cfg(feature = "trace")] mut writer: EventWriter<crate::SpiderTraceEvent>,
) {
    let context = match rapier.single() {
        Ok(context) => context,
        Err(err) => {
            if !query.is_empty() {
                tracing::warn!(%err, "no rapier context; skipping physics locomotion");
            }
            return;
        }
    };

    let world = RapierWorldQuery::new(&context);
    let ctx = TickContext::new(tick.tick, tick.dt_seconds);

    for (entity, body, mut controller, intent, mut transform, mut character, last) in
        query.iter_mut()
    {
        let intent = intent.map(|i| i.0).unwrap_or_default();
        let mut placement = KinematicPlacement::new(&context, entity, *body, &transform);
        let report = controller.0.tick(&ctx, intent, &world, &mut placement);

        character.translation = Some(placement.pending());
        transform.rotation = placement.bevy_rotation();

        #[cfg(feature = "trace")]
        writer.write(crate::SpiderTraceEvent {
            entity,
            trace: TickTrace::from(&report),
        });

        if let Some(mut last) = last {
            last.0 = Some(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spider_core::CategoryMask;

    #[test]
    fn entity_ids_round_trip_through_surface_ids() {
        let entity = Entity::from_raw(42);
        assert_eq!(entity_for(surface_id(entity)), Some(entity));
    }

    #[test]
    fn body_has_default_skin() {
        let body = SpiderRapierBody::new(0.5);
        assert_eq!(body.radius, 0.5);
        assert!(body.skin > 0.0);
    }

    #[test]
    fn category_mask_maps_to_collision_groups() {
        let filter = ProbeFilter::new(CategoryMask(0b11));
        let query = query_filter(&filter);
        let groups = query.groups.expect("groups are always set");
        assert_eq!(groups.filters, Group::from_bits_truncate(0b11));
    }
}
