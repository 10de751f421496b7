//! World - central ECS container

use std::any::{self, TypeId};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace, warn};

use super::entity::EntityAllocator;
use super::query::{ComponentIter, ComponentSet, Query, Records};
use super::system::SystemRegistry;
use super::{Component, ComponentBundle, EntityComponents, EntityId, System, SystemId, WorldError};
use crate::config::WorldConfig;

/// World holds all entities, components and systems.
///
/// Every entity owns an attachment-ordered component map, and every component
/// type owns the set of entities carrying it. The two views are kept in sync
/// by each mutating call, and a type whose entity set becomes empty is
/// dropped from the index.
pub struct World {
    entities: EntityAllocator,
    records: Records,
    index: HashMap<TypeId, BTreeSet<EntityId>>,
    dead: BTreeSet<EntityId>,
    systems: SystemRegistry,
    default_category: String,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    pub fn with_config(config: &WorldConfig) -> Self {
        Self {
            entities: EntityAllocator::starting_at(config.first_entity_id),
            records: HashMap::new(),
            index: HashMap::new(),
            dead: BTreeSet::new(),
            systems: SystemRegistry::default(),
            default_category: config.default_category.clone(),
        }
    }

    // -- Entity lifecycle --

    /// Create an entity with the given components.
    ///
    /// `components` is `()` or a tuple of components, attached in order.
    pub fn add_entity<B: ComponentBundle>(&mut self, components: B) -> EntityId {
        let id = self.entities.allocate();
        let mut record = EntityComponents::new();
        for (type_id, component) in components.into_components() {
            record.insert(type_id, component);
            self.index.entry(type_id).or_default().insert(id);
        }
        trace!(entity = id, components = record.len(), "entity created");
        self.records.insert(id, record);
        id
    }

    /// Create an entity without components.
    pub fn create_entity(&mut self) -> EntityId {
        self.add_entity(())
    }

    /// Delete an entity, either now or at the next reconciliation.
    ///
    /// A deferred deletion leaves the entity fully visible to queries until
    /// [`reconcile_deaths`](Self::reconcile_deaths) runs. Marking the same
    /// entity twice is harmless.
    pub fn delete_entity(&mut self, entity: EntityId, immediate: bool) -> Result<(), WorldError> {
        if !self.records.contains_key(&entity) {
            return Err(WorldError::EntityNotFound(entity));
        }
        if immediate {
            self.purge(entity);
            trace!(entity, "entity deleted");
        } else if self.dead.insert(entity) {
            trace!(entity, "entity marked for deletion");
        }
        Ok(())
    }

    /// Apply every deferred deletion. Returns the number of entities removed.
    pub fn reconcile_deaths(&mut self) -> usize {
        if self.dead.is_empty() {
            return 0;
        }
        let dead = std::mem::take(&mut self.dead);
        let marked = dead.len();
        let removed = dead.into_iter().filter(|&id| self.purge(id)).count();
        debug!(marked, removed, "reconciled deferred deletions");
        removed
    }

    pub fn entity_exists(&self, entity: EntityId) -> bool {
        self.records.contains_key(&entity)
    }

    /// Number of live entities, including those marked for deletion.
    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_marked_dead(&self, entity: EntityId) -> bool {
        self.dead.contains(&entity)
    }

    /// Number of entities waiting for reconciliation.
    pub fn pending_deletions(&self) -> usize {
        self.dead.len()
    }

    /// Live entity ids in ascending order.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.records.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn purge(&mut self, entity: EntityId) -> bool {
        self.dead.remove(&entity);
        let Some(record) = self.records.remove(&entity) else {
            return false;
        };
        for type_id in record.type_ids() {
            self.unindex(type_id, entity);
        }
        true
    }

    fn unindex(&mut self, type_id: TypeId, entity: EntityId) {
        if let Entry::Occupied(mut members) = self.index.entry(type_id) {
            members.get_mut().remove(&entity);
            if members.get().is_empty() {
                members.remove();
            }
        }
    }

    // -- Component operations --

    /// Attach `component` to `entity`, replacing any component of the same
    /// type.
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<(), WorldError> {
        let record = self
            .records
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound(entity))?;
        let type_id = TypeId::of::<T>();
        if record.insert(type_id, Box::new(component)).is_some() {
            trace!(entity, component = any::type_name::<T>(), "component replaced");
        }
        self.index.entry(type_id).or_default().insert(entity);
        Ok(())
    }

    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.records
            .get(&entity)
            .is_some_and(|record| record.contains(TypeId::of::<T>()))
    }

    pub fn get_component_from_entity<T: Component>(
        &self,
        entity: EntityId,
    ) -> Result<&T, WorldError> {
        self.records
            .get(&entity)
            .ok_or(WorldError::EntityNotFound(entity))?
            .get::<T>()
            .ok_or_else(|| component_not_found::<T>(entity))
    }

    pub fn get_component_from_entity_mut<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Result<&mut T, WorldError> {
        self.records
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound(entity))?
            .get_mut::<T>()
            .ok_or_else(|| component_not_found::<T>(entity))
    }

    /// Every component on `entity`, in the order they were first attached.
    pub fn get_all_components_from_entity(
        &self,
        entity: EntityId,
    ) -> Result<Vec<&dyn Component>, WorldError> {
        let record = self
            .records
            .get(&entity)
            .ok_or(WorldError::EntityNotFound(entity))?;
        Ok(record.values().collect())
    }

    /// Detach and return the `T` on `entity`.
    ///
    /// Removing the last component of an entity removes the entity as well,
    /// together with any pending deferred deletion for it.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<T, WorldError> {
        let type_id = TypeId::of::<T>();
        let record = self
            .records
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound(entity))?;
        let removed = record
            .remove(type_id)
            .ok_or_else(|| component_not_found::<T>(entity))?;
        let emptied = record.is_empty();
        self.unindex(type_id, entity);
        if emptied {
            self.records.remove(&entity);
            self.dead.remove(&entity);
            trace!(entity, "entity pruned after losing its last component");
        }
        removed
            .into_any()
            .downcast::<T>()
            .map(|component| *component)
            .map_err(|_| component_not_found::<T>(entity))
    }

    /// Lazily yield every `(entity, &T)`, in ascending entity order.
    ///
    /// A type no entity carries yields nothing.
    pub fn get_component<T: Component>(&self) -> ComponentIter<'_, T> {
        ComponentIter::new(&self.records, self.index.get(&TypeId::of::<T>()))
    }

    /// Lazily yield every entity carrying all types of `Q`, together with
    /// those components in request order.
    ///
    /// If any requested type has no entities at all the result is empty.
    ///
    /// ```
    /// use cecs::ecs::{Component, World};
    ///
    /// struct A(u8);
    /// impl Component for A {}
    /// struct B(u8);
    /// impl Component for B {}
    ///
    /// let mut world = World::new();
    /// let both = world.add_entity((A(1), B(1)));
    /// world.add_entity((A(2),));
    /// world.add_entity((B(3),));
    ///
    /// let hits: Vec<_> = world.get_components::<(A, B)>().map(|(id, _)| id).collect();
    /// assert_eq!(hits, vec![both]);
    /// ```
    pub fn get_components<Q: ComponentSet>(&self) -> Query<'_, Q> {
        let sets: Option<Vec<&BTreeSet<EntityId>>> = Q::type_ids()
            .iter()
            .map(|type_id| self.index.get(type_id))
            .collect();
        Query::new(&self.records, sets)
    }

    /// Snapshot of the entities [`get_components`](Self::get_components)
    /// would visit. Use it for passes that mutate the world while walking.
    pub fn query_entities<Q: ComponentSet>(&self) -> Vec<EntityId> {
        self.get_components::<Q>().map(|(id, _)| id).collect()
    }

    /// Number of entities carrying a `T`.
    pub fn component_count<T: Component>(&self) -> usize {
        self.index
            .get(&TypeId::of::<T>())
            .map_or(0, BTreeSet::len)
    }

    /// Whether any entity currently carries a `T`.
    pub fn is_component_indexed<T: Component>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    // -- Systems --

    /// Register `system` in the default category.
    pub fn add_system<S: System>(&mut self, system: S) -> SystemId {
        let category = self.default_category.clone();
        self.add_system_to_category(system, category)
    }

    pub fn add_system_to_category<S: System>(
        &mut self,
        system: S,
        category: impl Into<String>,
    ) -> SystemId {
        let category = category.into();
        let name = system.name().to_string();
        let id = self.systems.register(Box::new(system), category.clone());
        debug!(system = id, name = %name, category = %category, "system registered");
        id
    }

    /// Unregister a system, pruning its category once it is empty.
    pub fn remove_system(&mut self, id: SystemId) -> Result<(), WorldError> {
        match self.systems.remove(id) {
            Some(_) => {
                debug!(system = id, "system removed");
                Ok(())
            }
            None => Err(WorldError::SystemNotFound(id)),
        }
    }

    /// Unregister a system and hand it back. Fails for unknown ids and for a
    /// system that is currently running.
    pub fn take_system(&mut self, id: SystemId) -> Result<Box<dyn System>, WorldError> {
        if self.systems.get(id).is_none() {
            return Err(WorldError::SystemNotFound(id));
        }
        match self.systems.remove(id) {
            Some(Some(system)) => Ok(system),
            _ => Err(WorldError::SystemNotFound(id)),
        }
    }

    /// Remove every system of `category`. Returns how many were removed.
    pub fn remove_system_category(&mut self, category: &str) -> usize {
        let members = self.systems.category_members(category);
        for &id in &members {
            self.systems.remove(id);
        }
        if !members.is_empty() {
            debug!(category, removed = members.len(), "system category removed");
        }
        members.len()
    }

    pub fn has_system_category(&self, category: &str) -> bool {
        self.systems.has_category(category)
    }

    /// Member ids of `category` in registration order.
    pub fn systems_in_category(&self, category: &str) -> Vec<SystemId> {
        self.systems.category_members(category)
    }

    pub fn system_category(&self, id: SystemId) -> Result<&str, WorldError> {
        self.systems
            .category_of(id)
            .ok_or(WorldError::SystemNotFound(id))
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Look up a system. A system is detached from the table while it runs,
    /// so it cannot look itself up from inside its own `process`.
    pub fn get_system(&self, id: SystemId) -> Result<&dyn System, WorldError> {
        self.systems.get(id).ok_or(WorldError::SystemNotFound(id))
    }

    pub fn get_system_mut(
        &mut self,
        id: SystemId,
    ) -> Result<&mut (dyn System + 'static), WorldError> {
        self.systems
            .get_mut(id)
            .ok_or(WorldError::SystemNotFound(id))
    }

    /// Look up a system and downcast it to its concrete type.
    pub fn get_system_as<S: System>(&self, id: SystemId) -> Result<&S, WorldError> {
        self.get_system(id)?
            .downcast_ref::<S>()
            .ok_or(WorldError::SystemTypeMismatch {
                id,
                expected: any::type_name::<S>(),
            })
    }

    // -- Processing --

    /// Run the given systems in order.
    ///
    /// Every id is checked before anything runs; an unknown id fails the call
    /// without running any system. Deferred deletions are not applied.
    pub fn process_systems(&mut self, ids: &[SystemId]) -> Result<(), WorldError> {
        if let Some(&missing) = ids.iter().find(|&&id| !self.systems.contains(id)) {
            return Err(WorldError::SystemNotFound(missing));
        }
        self.run_pass(ids)
    }

    /// Run every system of each category, categories in argument order and
    /// systems in registration order. Unknown categories are skipped.
    /// Deferred deletions are not applied.
    pub fn process_system_categories(&mut self, categories: &[&str]) -> Result<(), WorldError> {
        let ids: Vec<SystemId> = categories
            .iter()
            .flat_map(|category| self.systems.category_members(category))
            .collect();
        self.run_pass(&ids)
    }

    /// Apply deferred deletions, then run every system in registration order.
    pub fn process_all(&mut self) -> Result<(), WorldError> {
        self.reconcile_deaths();
        let ids = self.systems.ids();
        self.run_pass(&ids)
    }

    fn run_pass(&mut self, ids: &[SystemId]) -> Result<(), WorldError> {
        debug!(systems = ids.len(), "processing systems");
        for &id in ids {
            self.run_system(id)?;
        }
        Ok(())
    }

    fn run_system(&mut self, id: SystemId) -> Result<(), WorldError> {
        let Some(mut system) = self.systems.check_out(id) else {
            trace!(system = id, "system gone or already running, skipped");
            return Ok(());
        };
        let result = system.process(self);
        let name = system.name().to_string();
        if !self.systems.check_in(id, system) {
            debug!(system = id, name = %name, "system dropped after removing itself");
        }
        result.map_err(|source| {
            warn!(system = id, name = %name, error = %source, "system failed");
            WorldError::SystemFailed { id, name, source }
        })
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn component_not_found<T: Component>(entity: EntityId) -> WorldError {
    WorldError::ComponentNotFound {
        entity,
        component: any::type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }
    impl Component for Velocity {}

    #[derive(Debug, PartialEq)]
    struct Frozen;
    impl Component for Frozen {}

    impl World {
        /// Checks that the type index and the per-entity maps agree.
        fn assert_consistent(&self) {
            for (type_id, members) in &self.index {
                assert!(!members.is_empty(), "empty index set kept");
                for id in members {
                    let record = self.records.get(id).expect("indexed entity is live");
                    assert!(record.contains(*type_id));
                }
            }
            for (id, record) in &self.records {
                for type_id in record.type_ids() {
                    assert!(self.index.get(&type_id).is_some_and(|set| set.contains(id)));
                }
            }
        }
    }

    #[test]
    fn test_world_entity_lifecycle() {
        let mut world = World::new();

        let e1 = world.create_entity();
        let e2 = world.create_entity();

        assert!(world.entity_exists(e1));
        assert!(world.entity_exists(e2));
        assert_eq!(world.entity_count(), 2);

        world.delete_entity(e1, true).unwrap();
        assert!(!world.entity_exists(e1));
        assert!(world.entity_exists(e2));
        assert_eq!(world.entity_count(), 1);
        world.assert_consistent();
    }

    #[test]
    fn test_world_components() {
        let mut world = World::new();

        let entity = world.create_entity();
        world.add_component(entity, Position { x: 1.0, y: 2.0 }).unwrap();
        world.add_component(entity, Velocity { dx: 0.5, dy: 0.5 }).unwrap();

        assert!(world.has_component::<Position>(entity));
        assert!(world.has_component::<Velocity>(entity));

        let pos = world.get_component_from_entity::<Position>(entity).unwrap();
        assert_eq!(pos.x, 1.0);

        world
            .get_component_from_entity_mut::<Velocity>(entity)
            .unwrap()
            .dx = 1.0;

        let vel = world.get_component_from_entity::<Velocity>(entity).unwrap();
        assert_eq!(vel.dx, 1.0);
        world.assert_consistent();
    }

    #[test]
    fn test_add_component_to_missing_entity() {
        let mut world = World::new();

        let err = world.add_component(7, Frozen).unwrap_err();
        assert!(matches!(err, WorldError::EntityNotFound(7)));
        assert!(!world.is_component_indexed::<Frozen>());
    }

    #[test]
    fn test_immediate_delete_prunes_index() {
        let mut world = World::new();
        let e = world.add_entity((Position { x: 0.0, y: 0.0 }, Frozen));
        let other = world.add_entity((Position { x: 1.0, y: 1.0 },));

        world.delete_entity(e, true).unwrap();

        assert!(!world.is_component_indexed::<Frozen>());
        assert_eq!(world.component_count::<Position>(), 1);
        assert!(world.entity_exists(other));
        world.assert_consistent();
    }

    #[test]
    fn test_reconcile_skips_vanished_entities() {
        let mut world = World::new();
        let pruned = world.add_entity((Frozen,));
        let deleted = world.add_entity((Frozen,));
        let kept = world.add_entity((Frozen,));

        world.delete_entity(pruned, false).unwrap();
        world.delete_entity(deleted, false).unwrap();
        world.delete_entity(kept, false).unwrap();
        world.remove_component::<Frozen>(pruned).unwrap();
        world.delete_entity(deleted, true).unwrap();

        assert_eq!(world.pending_deletions(), 1);
        assert_eq!(world.reconcile_deaths(), 1);
        assert_eq!(world.entity_count(), 0);
        assert!(!world.is_component_indexed::<Frozen>());
        world.assert_consistent();
    }

    #[test]
    fn test_remove_component_returns_value() {
        let mut world = World::new();
        let e = world.add_entity((Position { x: 3.0, y: 4.0 }, Frozen));

        let pos = world.remove_component::<Position>(e).unwrap();

        assert_eq!(pos, Position { x: 3.0, y: 4.0 });
        assert!(world.entity_exists(e));
        assert!(!world.is_component_indexed::<Position>());
        world.assert_consistent();
    }

    #[test]
    fn test_remove_missing_component_leaves_world_untouched() {
        let mut world = World::new();
        let e = world.add_entity((Frozen,));

        let err = world.remove_component::<Position>(e).unwrap_err();

        assert!(matches!(err, WorldError::ComponentNotFound { entity, .. } if entity == e));
        assert!(world.has_component::<Frozen>(e));
        world.assert_consistent();
    }

    #[test]
    fn test_query_drives_from_smallest_set() {
        let mut world = World::new();
        for i in 0..50 {
            world.add_entity((Position { x: i as f32, y: 0.0 },));
        }
        let frozen = world.add_entity((Position { x: -1.0, y: 0.0 }, Frozen));

        let query = world.get_components::<(Position, Frozen)>();
        assert_eq!(query.size_hint().1, Some(1));
        let hits: Vec<_> = query.collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, frozen);
        assert_eq!(hits[0].1 .0.x, -1.0);
    }

    #[test]
    fn test_config_first_entity_id() {
        let config = WorldConfig {
            first_entity_id: 1,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(&config);

        assert_eq!(world.create_entity(), 1);
        assert_eq!(world.create_entity(), 2);
    }
}
