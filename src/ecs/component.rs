//! Components and per-entity component storage

use std::any::{self, Any, TypeId};
use std::fmt;

/// Type-erasure helpers shared by components and systems.
///
/// Implemented for every `'static` type; the registry uses it to recover
/// concrete types from trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// Trait for components
///
/// Components are plain data. They are indexed by their type only, never by
/// value, so any `'static` type can opt in with an empty impl:
///
/// ```
/// use cecs::ecs::Component;
///
/// struct Health(u32);
/// impl Component for Health {}
/// ```
pub trait Component: AsAny + Send + Sync + 'static {}

impl dyn Component {
    /// Returns `true` if the boxed component is a `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component<{}>", self.type_name())
    }
}

/// The components attached to one entity, in attachment order.
///
/// An entity holds at most one component per type. Replacing a component
/// keeps its original position.
#[derive(Default)]
pub struct EntityComponents {
    entries: Vec<(TypeId, Box<dyn Component>)>,
}

impl EntityComponents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `component` under `type_id`, returning the value it replaced.
    pub fn insert(
        &mut self,
        type_id: TypeId,
        component: Box<dyn Component>,
    ) -> Option<Box<dyn Component>> {
        match self.entries.iter_mut().find(|(id, _)| *id == type_id) {
            Some((_, slot)) => Some(std::mem::replace(slot, component)),
            None => {
                self.entries.push((type_id, component));
                None
            }
        }
    }

    pub fn remove(&mut self, type_id: TypeId) -> Option<Box<dyn Component>> {
        let position = self.entries.iter().position(|(id, _)| *id == type_id)?;
        Some(self.entries.remove(position).1)
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.entries.iter().any(|(id, _)| *id == type_id)
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        let type_id = TypeId::of::<T>();
        self.entries
            .iter()
            .find(|(id, _)| *id == type_id)
            .and_then(|(_, component)| (**component).downcast_ref::<T>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let type_id = TypeId::of::<T>();
        self.entries
            .iter_mut()
            .find(|(id, _)| *id == type_id)
            .and_then(|(_, component)| (**component).downcast_mut::<T>())
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn values(&self) -> impl Iterator<Item = &dyn Component> + '_ {
        self.entries.iter().map(|(_, component)| &**component)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A group of components attached together by
/// [`World::add_entity`](super::World::add_entity).
///
/// Implemented for `()` and for tuples of up to eight components. Components
/// are attached in tuple order, so a later component of an already present
/// type replaces the earlier one.
pub trait ComponentBundle {
    fn into_components(self) -> Vec<(TypeId, Box<dyn Component>)>;
}

impl ComponentBundle for () {
    fn into_components(self) -> Vec<(TypeId, Box<dyn Component>)> {
        Vec::new()
    }
}

macro_rules! impl_component_bundle {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentBundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_components(self) -> Vec<(TypeId, Box<dyn Component>)> {
                let ($($name,)+) = self;
                vec![$((TypeId::of::<$name>(), Box::new($name) as Box<dyn Component>)),+]
            }
        }
    };
}

impl_component_bundle!(A);
impl_component_bundle!(A, B);
impl_component_bundle!(A, B, C);
impl_component_bundle!(A, B, C, D);
impl_component_bundle!(A, B, C, D, E);
impl_component_bundle!(A, B, C, D, E, F);
impl_component_bundle!(A, B, C, D, E, F, G);
impl_component_bundle!(A, B, C, D, E, F, G, H);
