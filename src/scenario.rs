use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::{
    config::{LoggingConfig, WorldConfig},
    engine::{EngineBuilder, EngineSettings},
    rng::RngManager,
    systems::{AgingSystem, CensusSystem, MovementSystem, SpawnSettings, SpawnerSystem},
};

fn default_ticks() -> u64 {
    60
}

fn default_max_speed() -> f32 {
    1.0
}

fn default_bounds() -> f32 {
    50.0
}

fn default_phases() -> Vec<String> {
    vec!["spawn".into(), "simulation".into(), "report".into()]
}

/// A seeded drift simulation: entities spawn at the origin, drift, anchor
/// when they leave the bounds and expire when their lifetime runs out.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub initial_entities: u32,
    #[serde(default)]
    pub spawn_per_tick: u32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_bounds")]
    pub bounds: f32,
    pub lifetime: LifetimeRange,
    #[serde(default = "default_phases")]
    pub phases: Vec<String>,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LifetimeRange {
    pub min: u32,
    pub max: u32,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(data)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.lifetime.min > 0 && self.lifetime.min <= self.lifetime.max,
            "lifetime range {}..={} is empty or starts at zero",
            self.lifetime.min,
            self.lifetime.max
        );
        ensure!(
            self.max_speed.is_finite() && self.max_speed > 0.0,
            "max_speed must be positive and finite"
        );
        ensure!(
            self.bounds.is_finite() && self.bounds > 0.0,
            "bounds must be positive and finite"
        );
        Ok(())
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.unwrap_or(self.ticks)
    }

    /// Build an engine with the initial population spawned and the drift
    /// systems registered: spawner in `spawn`, movement and aging in
    /// `simulation`, census in `report`.
    pub fn build_engine(&self) -> EngineBuilder {
        let mut rng = RngManager::new(self.seed);
        let mut spawner = SpawnerSystem::new(
            SpawnSettings {
                per_tick: self.spawn_per_tick,
                max_speed: self.max_speed,
                lifetime_min: self.lifetime.min,
                lifetime_max: self.lifetime.max,
            },
            rng.stream("spawner"),
        );

        let settings = EngineSettings {
            scenario_name: self.name.clone(),
            world: self.world.clone(),
            phases: self.phases.clone(),
        };
        let mut builder = EngineBuilder::new(settings);
        spawner.spawn_batch(builder.world_mut(), self.initial_entities);

        builder
            .with_system("spawn", spawner)
            .with_system("simulation", MovementSystem::new(self.bounds))
            .with_system("simulation", AgingSystem::new())
            .with_census("report", CensusSystem::new())
    }
}
