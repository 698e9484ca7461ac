//! Gizmo drawing of the probes recorded in [`SpiderLastReport`].
//!
//! Probe shapes are only recorded when the controller's `debug_draw` flag is set.

use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::gizmos::Gizmos;
use spider_core::glam::{Quat, Vec3};
use spider_core::ProbeShape;

use crate::SpiderLastReport;

const RING_SEGMENTS: usize = 12;

#[derive(Resource, Debug, Clone)]
pub struct SpiderDebugConfig {
    pub enabled: bool,
    /// Probe with no hits (RGBA).
    pub clear_color: [f32; 4],
    /// Probe that hit something (RGBA).
    pub hit_color: [f32; 4],
}

impl Default for SpiderDebugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clear_color: [0.2, 1.0, 0.2, 1.0],
            hit_color: [1.0, 0.2, 0.2, 1.0],
        }
    }
}

fn color_from_rgba(rgba: [f32; 4]) -> Color {
    Color::srgba(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn draw_ring(gizmos: &mut Gizmos, center: Vec3, axis: Vec3, radius: f32, color: Color) {
    let u = axis.any_orthonormal_vector();
    let v = axis.cross(u);
    for i in 0..RING_SEGMENTS {
        let a0 = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
        let a1 = (i + 1) as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
        let p0 = center + (u * a0.cos() + v * a0.sin()) * radius;
        let p1 = center + (u * a1.cos() + v * a1.sin()) * radius;
        gizmos.line(p0, p1, color);
    }
}

/// Capsule outline: both cap rings at the sweep start and end, joined along the sweep.
pub fn draw_capsule(
    gizmos: &mut Gizmos,
    start: Vec3,
    end: Vec3,
    radius: f32,
    half_height: f32,
    orientation: Quat,
    color: Color,
) {
    let axis = (orientation * Vec3::Z).normalize_or_zero();
    if axis == Vec3::ZERO {
        return;
    }
    let half = (half_height - radius).max(0.0);
    for center in [start, end] {
        let top = center + axis * half;
        let bottom = center - axis * half;
        gizmos.line(top + axis * radius, bottom - axis * radius, color);
        draw_ring(gizmos, top, axis, radius, color);
        draw_ring(gizmos, bottom, axis, radius, color);
    }
    gizmos.line(start, end, color);
}

pub fn draw_ray(
    gizmos: &mut Gizmos,
    start: Vec3,
    end: Vec3,
    hit: Option<Vec3>,
    clear: Color,
    blocked: Color,
) {
    match hit {
        Some(point) => {
            gizmos.line(start, point, blocked);
            gizmos.line(point, end, clear);
        }
        None => gizmos.line(start, end, clear),
    }
}

pub fn draw_spider_probes(
    config: Option<Res<SpiderDebugConfig>>,
    mut gizmos: Gizmos,
    query: Query<&SpiderLastReport>,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();
    if !config.enabled {
        return;
    }
    let clear = color_from_rgba(config.clear_color);
    let blocked = color_from_rgba(config.hit_color);

    for report in query.iter().filter_map(|last| last.0.as_ref()) {
        for probe in &report.probes {
            match *probe {
                ProbeShape::Capsule {
                    start,
                    end,
                    radius,
                    half_height,
                    orientation,
                    hit_count,
                } => {
                    let color = if hit_count > 0 { blocked } else { clear };
                    draw_capsule(&mut gizmos, start, end, radius, half_height, orientation, color);
                }
                ProbeShape::Ray { start, end, hit } => {
                    draw_ray(&mut gizmos, start, end, hit, clear, blocked);
                }
            }
        }
    }
}
