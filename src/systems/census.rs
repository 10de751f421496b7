use anyhow::Result;
use serde::Serialize;

use crate::{
    components::{Anchored, Position, Velocity},
    ecs::{System, World},
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CensusReport {
    pub entities: usize,
    pub moving: usize,
    pub anchored: usize,
    pub marked_dead: usize,
    /// Mean distance from the origin over all positioned entities.
    pub mean_distance: f32,
}

/// Summarises the world after the other systems ran.
#[derive(Default)]
pub struct CensusSystem {
    latest: Option<CensusReport>,
}

impl CensusSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&CensusReport> {
        self.latest.as_ref()
    }
}

impl System for CensusSystem {
    fn name(&self) -> &str {
        "census"
    }

    fn process(&mut self, world: &mut World) -> Result<()> {
        let (count, total) = world
            .get_component::<Position>()
            .fold((0usize, 0.0f32), |(count, total), (_, pos)| {
                (count + 1, total + (pos.x * pos.x + pos.y * pos.y).sqrt())
            });
        let mean_distance = if count == 0 { 0.0 } else { total / count as f32 };
        self.latest = Some(CensusReport {
            entities: world.entity_count(),
            moving: world.get_components::<(Position, Velocity)>().count(),
            anchored: world.component_count::<Anchored>(),
            marked_dead: world.pending_deletions(),
            mean_distance,
        });
        Ok(())
    }
}
