mod aging;
mod census;
mod movement;
mod spawner;

pub use aging::AgingSystem;
pub use census::{CensusReport, CensusSystem};
pub use movement::MovementSystem;
pub use spawner::{SpawnSettings, SpawnerSystem};
