//! Entity Component System (ECS) implementation
//!
//! Entities are plain integer ids. Components live in per-entity maps keyed
//! by type, mirrored by a per-type index of entity ids that backs the
//! queries. Systems are registered with the [`World`] and driven by its
//! processing entrypoints.

pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod system;
pub mod world;

pub use component::{AsAny, Component, ComponentBundle, EntityComponents};
pub use entity::{EntityAllocator, EntityId};
pub use error::WorldError;
pub use query::{ComponentIter, ComponentSet, Query};
pub use system::{System, SystemId};
pub use world::World;
