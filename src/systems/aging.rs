use anyhow::Result;

use crate::{
    components::Lifetime,
    ecs::{System, World},
};

/// Counts lifetimes down and marks expired entities for deletion. The
/// deletion is deferred, so expired entities stay visible until the next
/// reconciliation.
#[derive(Default)]
pub struct AgingSystem;

impl AgingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for AgingSystem {
    fn name(&self) -> &str {
        "aging"
    }

    fn process(&mut self, world: &mut World) -> Result<()> {
        for id in world.query_entities::<(Lifetime,)>() {
            if world.is_marked_dead(id) {
                continue;
            }
            let lifetime = world.get_component_from_entity_mut::<Lifetime>(id)?;
            lifetime.ticks_left = lifetime.ticks_left.saturating_sub(1);
            if lifetime.ticks_left == 0 {
                world.delete_entity(id, false)?;
            }
        }
        Ok(())
    }
}
