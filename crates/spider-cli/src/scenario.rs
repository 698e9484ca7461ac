//! YAML scenario files for the headless runner.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use spider_core::glam::{Quat, Vec2, Vec3};
use spider_core::{
    CategoryMask, LocomotionConfig, MovementIntent, Panel, PanelWorld, SimBody, SurfaceId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub ticks: u64,
    pub dt_seconds: f32,
    pub config: LocomotionConfig,
    pub spawn: SpawnConfig,
    pub body: BodyConfig,
    pub intent: MovementIntent,
    pub panels: Vec<PanelSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub location: Vec3,
    /// Heading around world up, in degrees from +X.
    pub yaw_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub collision_radius: f32,
    pub slide: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub id: u64,
    pub center: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub half_extents: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            location: Vec3::new(0.0, 0.0, 80.0),
            yaw_degrees: 0.0,
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            collision_radius: 80.0,
            slide: true,
        }
    }
}

impl Default for Scenario {
    /// A floor with a wall 400 units ahead of the spawn point.
    fn default() -> Self {
        Self {
            ticks: 240,
            dt_seconds: 1.0 / 60.0,
            config: LocomotionConfig::default(),
            spawn: SpawnConfig::default(),
            body: BodyConfig::default(),
            intent: MovementIntent::forward(0.5),
            panels: vec![
                PanelSpec {
                    id: 1,
                    center: Vec3::ZERO,
                    normal: Vec3::Z,
                    tangent: Vec3::X,
                    half_extents: Vec2::splat(2000.0),
                    category: None,
                },
                PanelSpec {
                    id: 2,
                    center: Vec3::new(400.0, 0.0, 1000.0),
                    normal: Vec3::NEG_X,
                    tangent: Vec3::Y,
                    half_extents: Vec2::splat(1000.0),
                    category: None,
                },
            ],
        }
    }
}

impl PanelSpec {
    pub fn to_panel(&self) -> Result<Panel> {
        let panel = Panel::new(
            SurfaceId(self.id),
            self.center,
            self.normal,
            self.tangent,
            self.half_extents,
        )
        .with_context(|| format!("panel {} has a degenerate normal", self.id))?;
        Ok(match self.category {
            Some(bits) => panel.with_category(CategoryMask(bits)),
            None => panel,
        })
    }
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        let scenario: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))?;
        Ok(scenario)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to encode scenario")
    }

    /// Check everything a run would reject, without running.
    pub fn validate(&self) -> Result<()> {
        self.config.validate().context("invalid locomotion config")?;
        if !self.dt_seconds.is_finite() || self.dt_seconds < 0.0 {
            bail!("dt_seconds must be finite and non-negative (got {})", self.dt_seconds);
        }
        if !self.body.collision_radius.is_finite() || self.body.collision_radius < 0.0 {
            bail!(
                "body.collision_radius must be finite and non-negative (got {})",
                self.body.collision_radius
            );
        }
        self.build_world().map(|_| ())
    }

    pub fn build_world(&self) -> Result<PanelWorld> {
        let panels = self
            .panels
            .iter()
            .map(PanelSpec::to_panel)
            .collect::<Result<Vec<_>>>()?;
        Ok(PanelWorld::new(panels))
    }

    /// Spawn orientation: level with the configured world up, turned by `yaw_degrees`.
    pub fn spawn_orientation(&self) -> Quat {
        let up = self.config.world_up.try_normalize().unwrap_or(Vec3::Z);
        let level = Quat::from_rotation_arc(Vec3::Z, up);
        Quat::from_axis_angle(up, self.spawn.yaw_degrees.to_radians()) * level
    }

    pub fn spawn_body(&self, world: Arc<PanelWorld>) -> SimBody {
        SimBody::new(
            self.spawn.location,
            self.spawn_orientation(),
            self.body.collision_radius,
        )
        .with_blockers(world)
        .with_slide(self.body.slide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spider_core::Placement;

    #[test]
    fn default_scenario_is_valid() {
        Scenario::default().validate().unwrap();
    }

    #[test]
    fn yaml_roundtrips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        let scenario = Scenario::default();
        std::fs::write(&path, scenario.to_yaml().unwrap()).unwrap();

        let loaded = Scenario::load(&path).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let scenario: Scenario = serde_yaml::from_str(
            "ticks: 10\nconfig:\n  turn_rate: 2.0\nintent:\n  forward: 1.0\n  right: 0.0\n",
        )
        .unwrap();
        assert_eq!(scenario.ticks, 10);
        assert_eq!(scenario.config.turn_rate, 2.0);
        assert_eq!(scenario.config.probe_radius, 50.0);
        assert_eq!(scenario.body, BodyConfig::default());
        assert_eq!(scenario.panels.len(), 2);
    }

    #[test]
    fn degenerate_panel_is_rejected() {
        let mut scenario = Scenario::default();
        scenario.panels[0].normal = Vec3::ZERO;
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("panel 1"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut scenario = Scenario::default();
        scenario.config.probe_half_height = 10.0;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scenario.yaml"));
    }

    #[test]
    fn yaw_turns_the_spawn_heading() {
        let mut scenario = Scenario::default();
        scenario.spawn.yaw_degrees = 90.0;
        let body = scenario.spawn_body(Arc::new(PanelWorld::default()));
        let forward = body.orientation() * Vec3::X;
        assert!((forward - Vec3::Y).length() < 1e-5);
        assert_eq!(body.location(), Vec3::new(0.0, 0.0, 80.0));
    }
}
