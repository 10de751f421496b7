//! Systems and the system registry

use std::any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::{AsAny, World};

/// System ID type. Issued from zero, never reused.
pub type SystemId = u64;

/// System trait - a unit of per-tick logic driven by the [`World`].
///
/// The world is handed to [`process`](System::process) on every call instead
/// of being stored in the system, so a system can query and mutate entities
/// freely while it runs.
pub trait System: AsAny + Send + 'static {
    fn name(&self) -> &str {
        any::type_name::<Self>()
    }

    /// Called once when the system is registered.
    fn on_register(&mut self, _id: SystemId, _category: &str) {}

    fn process(&mut self, world: &mut World) -> anyhow::Result<()>;
}

impl dyn System {
    pub fn is<T: System>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: System>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: System>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "System<{}>", self.name())
    }
}

struct SystemSlot {
    category: String,
    /// `None` while the system is checked out and running.
    system: Option<Box<dyn System>>,
}

/// Systems by id plus the category membership sets.
///
/// Both maps are ordered by id, and ids are monotonic, so iteration follows
/// registration order everywhere.
#[derive(Default)]
pub(crate) struct SystemRegistry {
    next_id: SystemId,
    slots: BTreeMap<SystemId, SystemSlot>,
    categories: HashMap<String, BTreeSet<SystemId>>,
}

impl SystemRegistry {
    pub(crate) fn register(&mut self, mut system: Box<dyn System>, category: String) -> SystemId {
        let id = self.next_id;
        self.next_id += 1;
        system.on_register(id, &category);
        self.categories
            .entry(category.clone())
            .or_default()
            .insert(id);
        self.slots.insert(
            id,
            SystemSlot {
                category,
                system: Some(system),
            },
        );
        id
    }

    /// Drops `id` from the table and from its category, pruning the category
    /// once it is empty. Returns `None` for unknown ids; the inner `Option` is
    /// `None` when the system was checked out at the time.
    pub(crate) fn remove(&mut self, id: SystemId) -> Option<Option<Box<dyn System>>> {
        let slot = self.slots.remove(&id)?;
        if let Some(members) = self.categories.get_mut(&slot.category) {
            members.remove(&id);
            if members.is_empty() {
                self.categories.remove(&slot.category);
            }
        }
        Some(slot.system)
    }

    pub(crate) fn contains(&self, id: SystemId) -> bool {
        self.slots.contains_key(&id)
    }

    pub(crate) fn get(&self, id: SystemId) -> Option<&dyn System> {
        self.slots.get(&id)?.system.as_deref()
    }

    pub(crate) fn get_mut(&mut self, id: SystemId) -> Option<&mut (dyn System + 'static)> {
        self.slots.get_mut(&id)?.system.as_deref_mut()
    }

    pub(crate) fn category_of(&self, id: SystemId) -> Option<&str> {
        self.slots.get(&id).map(|slot| slot.category.as_str())
    }

    pub(crate) fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub(crate) fn category_members(&self, category: &str) -> Vec<SystemId> {
        self.categories
            .get(category)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn ids(&self) -> Vec<SystemId> {
        self.slots.keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Takes the system out of its slot so it can run with `&mut World`.
    /// Returns `None` if the id is unknown or the system is already running.
    pub(crate) fn check_out(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        self.slots.get_mut(&id)?.system.take()
    }

    /// Puts a checked-out system back. A system whose slot was removed while
    /// it ran is dropped here.
    pub(crate) fn check_in(&mut self, id: SystemId, system: Box<dyn System>) -> bool {
        match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.system = Some(system);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl System for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn process(&mut self, _world: &mut World) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        registered_as: Option<(SystemId, String)>,
    }

    impl System for Recorder {
        fn on_register(&mut self, id: SystemId, category: &str) {
            self.registered_as = Some((id, category.to_string()));
        }

        fn process(&mut self, _world: &mut World) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = SystemRegistry::default();

        let a = registry.register(Box::new(Noop), "physics".into());
        let b = registry.register(Box::new(Noop), "physics".into());
        let c = registry.register(Box::new(Noop), "render".into());

        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.category_members("physics"), vec![0, 1]);
        assert_eq!(registry.category_of(c), Some("render"));
    }

    #[test]
    fn test_on_register_sees_id_and_category() {
        let mut registry = SystemRegistry::default();
        registry.register(Box::new(Noop), "default".into());
        let id = registry.register(Box::new(Recorder::default()), "ai".into());

        let recorder = registry
            .get(id)
            .and_then(|system| system.downcast_ref::<Recorder>())
            .expect("recorder registered");
        assert_eq!(recorder.registered_as, Some((1, "ai".to_string())));
    }

    #[test]
    fn test_remove_prunes_empty_category() {
        let mut registry = SystemRegistry::default();
        let a = registry.register(Box::new(Noop), "physics".into());
        let b = registry.register(Box::new(Noop), "physics".into());

        assert!(registry.remove(a).is_some());
        assert!(registry.has_category("physics"));
        assert!(registry.remove(b).is_some());
        assert!(!registry.has_category("physics"));
        assert!(registry.remove(b).is_none());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = SystemRegistry::default();
        let a = registry.register(Box::new(Noop), "default".into());
        registry.remove(a);
        let b = registry.register(Box::new(Noop), "default".into());

        assert!(b > a);
    }

    #[test]
    fn test_check_out_and_in() {
        let mut registry = SystemRegistry::default();
        let id = registry.register(Box::new(Noop), "default".into());

        let system = registry.check_out(id).expect("slot filled");
        assert!(registry.contains(id));
        assert!(registry.get(id).is_none());
        assert!(registry.check_out(id).is_none());

        assert!(registry.check_in(id, system));
        assert_eq!(registry.get(id).map(|s| s.name()), Some("noop"));
    }

    #[test]
    fn test_check_in_after_removal_drops_system() {
        let mut registry = SystemRegistry::default();
        let id = registry.register(Box::new(Noop), "default".into());

        let system = registry.check_out(id).expect("slot filled");
        assert!(matches!(registry.remove(id), Some(None)));
        assert!(!registry.check_in(id, system));
        assert!(!registry.contains(id));
    }
}
