use anyhow::Result;

use crate::{
    components::{Anchored, Position, Velocity},
    ecs::{System, World},
};

/// Moves every entity by its velocity. An entity that leaves the square
/// `[-bounds, bounds]` loses its velocity and becomes [`Anchored`].
pub struct MovementSystem {
    bounds: f32,
}

impl MovementSystem {
    pub fn new(bounds: f32) -> Self {
        Self { bounds }
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn process(&mut self, world: &mut World) -> Result<()> {
        for id in world.query_entities::<(Position, Velocity)>() {
            let velocity = *world.get_component_from_entity::<Velocity>(id)?;
            let position = world.get_component_from_entity_mut::<Position>(id)?;
            position.x += velocity.dx;
            position.y += velocity.dy;
            let escaped = position.x.abs() > self.bounds || position.y.abs() > self.bounds;
            if escaped {
                world.remove_component::<Velocity>(id)?;
                world.add_component(id, Anchored)?;
            }
        }
        Ok(())
    }
}
