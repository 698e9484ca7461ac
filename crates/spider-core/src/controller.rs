//! The per-tick pipeline: walk, sample, classify, arbitrate, integrate.

use glam::{Quat, Vec3};

use crate::arbiter::{LocomotionMode, ModeArbiter};
use crate::classifier::{classify, SurfaceDecision};
use crate::config::{ConfigError, LocomotionConfig};
use crate::frame::FrameBuilder;
use crate::integrator::integrate;
use crate::probe::{Placement, ProbeHit, ProbeShape, SurfaceId, WorldQuery};
use crate::sampler::{capsule_shape, ray_shape, GroundProbe, SurfaceSampler, WallProbe, WallSample};
use crate::tick::{MovementIntent, TickContext};

/// Everything one tick decided and applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub mode: LocomotionMode,
    pub decision: SurfaceDecision,
    pub ground: Option<ProbeHit>,
    pub wall_hit_count: usize,
    /// Translation applied by the walk step.
    pub walk_applied: Vec3,
    /// Mode displacement requested from the placement service.
    pub displacement: Vec3,
    /// Mode displacement actually applied.
    pub applied: Vec3,
    pub target_orientation: Quat,
    pub orientation: Quat,
    pub location: Vec3,
    /// Probe shapes issued this tick; empty unless `debug_draw` is enabled.
    pub probes: Vec<ProbeShape>,
}

/// Locomotion controller for one agent.
///
/// Owns its probe buffers, so instances may tick independently; a single instance must not be
/// ticked re-entrantly.
#[derive(Debug, Clone)]
pub struct SpiderLocomotion {
    config: LocomotionConfig,
    sampler: SurfaceSampler,
    arbiter: ModeArbiter,
    wall: WallSample,
    last_mode: Option<LocomotionMode>,
}

impl SpiderLocomotion {
    pub fn new(config: LocomotionConfig) -> Result<Self, ConfigError> {
        Self::with_surface(config, None)
    }

    /// Like [`SpiderLocomotion::new`], excluding the agent's own surface from probe results.
    pub fn with_surface(
        config: LocomotionConfig,
        own_surface: Option<SurfaceId>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let sampler = SurfaceSampler::new(
            config.probe_filter(own_surface),
            WallProbe {
                radius: config.probe_radius,
                half_height: config.probe_half_height,
                offset: config.wall_trace_start_offset,
            },
            GroundProbe {
                forward_offset: config.ground_trace_forward_offset,
                distance: config.ground_trace_distance,
            },
        );
        let arbiter = ModeArbiter::new(
            FrameBuilder::new(config.world_up),
            config.gravity_factor,
            config.climb_pull,
        );

        Ok(Self {
            config,
            sampler,
            arbiter,
            wall: WallSample::default(),
            last_mode: None,
        })
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn sampler(&self) -> &SurfaceSampler {
        &self.sampler
    }

    pub fn arbiter(&self) -> &ModeArbiter {
        &self.arbiter
    }

    /// Wall hits gathered by the most recent tick.
    pub fn wall_sample(&self) -> &WallSample {
        &self.wall
    }

    /// Mode chosen by the most recent tick. Reporting only; arbitration never reads it.
    pub fn last_mode(&self) -> Option<LocomotionMode> {
        self.last_mode
    }

    pub fn tick<W, P>(
        &mut self,
        ctx: &TickContext,
        intent: MovementIntent,
        world: &W,
        placement: &mut P,
    ) -> TickReport
    where
        W: WorldQuery + ?Sized,
        P: Placement + ?Sized,
    {
        let dt = ctx.dt();
        let walk_applied = self.walk(intent, dt, placement);

        let location = placement.location();
        let orientation = placement.orientation();

        let sweep = self
            .sampler
            .sample_wall_surfaces_into(world, location, orientation, &mut self.wall);
        let (ray, ground) = self.sampler.sample_ground(world, location, orientation);

        let decision = classify(&self.wall.hits);
        let movement = self
            .arbiter
            .arbitrate(location, orientation, ground.as_ref(), &decision);

        let step = integrate(
            placement,
            movement.target_orientation,
            movement.displacement,
            dt,
            self.config.turn_rate,
        );

        let probes = if self.config.debug_draw {
            vec![
                capsule_shape(&sweep, self.wall.len()),
                ray_shape(&ray, ground.as_ref()),
            ]
        } else {
            Vec::new()
        };

        if self.last_mode != Some(movement.mode) {
            tracing::info!(
                tick = ctx.tick,
                from = ?self.last_mode,
                to = %movement.mode,
                "locomotion mode changed"
            );
        }
        self.last_mode = Some(movement.mode);

        tracing::debug!(
            tick = ctx.tick,
            mode = %movement.mode,
            wall_hits = self.wall.len(),
            grounded = ground.is_some(),
            applied = ?step.applied,
            "locomotion tick"
        );

        TickReport {
            tick: ctx.tick,
            mode: movement.mode,
            decision,
            ground,
            wall_hit_count: self.wall.len(),
            walk_applied,
            displacement: movement.displacement,
            applied: step.applied,
            target_orientation: movement.target_orientation,
            orientation: step.orientation,
            location: step.location,
            probes,
        }
    }

    /// Translate along the agent's current forward/right axes; orientation is left unchanged.
    fn walk<P: Placement + ?Sized>(
        &self,
        intent: MovementIntent,
        dt: f32,
        placement: &mut P,
    ) -> Vec3 {
        if intent.is_idle() || dt <= 0.0 {
            return Vec3::ZERO;
        }

        let orientation = placement.orientation();
        let local = glam::Vec2::new(intent.forward, intent.right).clamp_length_max(1.0);
        if !local.is_finite() {
            return Vec3::ZERO;
        }
        let direction = orientation * Vec3::X * local.x + orientation * Vec3::Y * local.y;
        let delta = direction * self.config.max_speed * dt;
        placement.move_with_sweep(delta, orientation)
    }
}
