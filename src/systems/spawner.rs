use anyhow::Result;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::{
    components::{Lifetime, Position, Velocity},
    ecs::{EntityId, System, World},
};

#[derive(Clone, Copy, Debug)]
pub struct SpawnSettings {
    pub per_tick: u32,
    pub max_speed: f32,
    pub lifetime_min: u32,
    pub lifetime_max: u32,
}

/// Spawns drifting entities at the origin with a random velocity and
/// lifetime.
pub struct SpawnerSystem {
    settings: SpawnSettings,
    rng: ChaCha8Rng,
}

impl SpawnerSystem {
    pub fn new(settings: SpawnSettings, rng: ChaCha8Rng) -> Self {
        Self { settings, rng }
    }

    pub fn spawn_batch(&mut self, world: &mut World, count: u32) -> Vec<EntityId> {
        (0..count).map(|_| self.spawn_one(world)).collect()
    }

    fn spawn_one(&mut self, world: &mut World) -> EntityId {
        let max_speed = self.settings.max_speed.max(f32::EPSILON);
        let velocity = Velocity::new(
            self.rng.gen_range(-max_speed..=max_speed),
            self.rng.gen_range(-max_speed..=max_speed),
        );
        let low = self.settings.lifetime_min.max(1);
        let high = self.settings.lifetime_max.max(low);
        let lifetime = Lifetime::new(self.rng.gen_range(low..=high));
        world.add_entity((Position::new(0.0, 0.0), velocity, lifetime))
    }
}

impl System for SpawnerSystem {
    fn name(&self) -> &str {
        "spawner"
    }

    fn process(&mut self, world: &mut World) -> Result<()> {
        self.spawn_batch(world, self.settings.per_tick);
        Ok(())
    }
}
