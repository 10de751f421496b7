use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::{
    config::WorldConfig,
    ecs::{System, SystemId, World},
    systems::{CensusReport, CensusSystem},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub world: WorldConfig,
    /// Categories run each tick, in order. Empty runs every system in
    /// registration order.
    pub phases: Vec<String>,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    world: World,
    census: Option<SystemId>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        let world = World::with_config(&settings.world);
        Self {
            settings,
            world,
            census: None,
        }
    }

    /// Direct access to the world before the first tick, e.g. to seed
    /// entities.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn with_system(mut self, category: &str, system: impl System) -> Self {
        self.world.add_system_to_category(system, category);
        self
    }

    /// Register a census whose report is attached to every [`TickSummary`].
    pub fn with_census(mut self, category: &str, census: CensusSystem) -> Self {
        self.census = Some(self.world.add_system_to_category(census, category));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            world: self.world,
            phases: self.settings.phases,
            census: self.census,
            scenario_name: self.settings.scenario_name,
            tick: 0,
        }
    }
}

/// Drives a [`World`] one tick at a time.
///
/// Each tick first applies the deferred deletions queued by the previous
/// tick, then runs the configured phases.
pub struct Engine {
    world: World,
    phases: Vec<String>,
    census: Option<SystemId>,
    scenario_name: String,
    tick: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub entities: usize,
    /// Entities removed by reconciliation at the start of the tick.
    pub reaped: usize,
    pub pending_deletions: usize,
    pub census: Option<CensusReport>,
}

impl Engine {
    pub fn tick(&mut self) -> Result<TickSummary> {
        self.tick += 1;
        let reaped = self.world.reconcile_deaths();
        let processed = if self.phases.is_empty() {
            self.world.process_all()
        } else {
            let phases: Vec<&str> = self.phases.iter().map(String::as_str).collect();
            self.world.process_system_categories(&phases)
        };
        processed
            .with_context(|| format!("tick {} of '{}' failed", self.tick, self.scenario_name))?;

        let census = match self.census {
            Some(id) => self.world.get_system_as::<CensusSystem>(id)?.latest().cloned(),
            None => None,
        };
        Ok(TickSummary {
            tick: self.tick,
            entities: self.world.entity_count(),
            reaped,
            pending_deletions: self.world.pending_deletions(),
            census,
        })
    }

    pub fn run(&mut self, ticks: u64) -> Result<()> {
        self.run_with_hook(ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickSummary),
    {
        for _ in 0..ticks {
            let summary = self.tick()?;
            hook(&summary);
        }
        info!(
            scenario = %self.scenario_name,
            ticks = self.tick,
            entities = self.world.entity_count(),
            "run finished"
        );
        Ok(())
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
