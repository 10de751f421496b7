//! A small entity-component-system registry.
//!
//! [`World`] owns entities, their components and the systems that operate on
//! them. The remaining modules form a seeded demo simulation built on top of
//! it and are used by the `cecs` binary.

pub mod components;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod logger;
pub mod rng;
pub mod scenario;
pub mod systems;

pub use config::{LoggingConfig, WorldConfig};
pub use ecs::{Component, EntityId, System, SystemId, World, WorldError};
pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
