//! Lazy component queries
//!
//! Both iterators borrow the [`World`](super::World) immutably for their whole
//! lifetime, so adding or removing components while one is alive does not
//! compile. Passes that need to mutate take an owned id snapshot with
//! [`World::query_entities`](super::World::query_entities) first.

use std::any::TypeId;
use std::collections::{btree_set, BTreeSet, HashMap};
use std::marker::PhantomData;

use super::{Component, EntityComponents, EntityId};

pub(crate) type Records = HashMap<EntityId, EntityComponents>;

/// A tuple of component types requested together.
///
/// Implemented for tuples of one to eight components. The fetched item keeps
/// the request order: `(A, B)` yields `(&A, &B)`.
pub trait ComponentSet: 'static {
    type Item<'w>;

    fn type_ids() -> Vec<TypeId>;

    fn fetch(record: &EntityComponents) -> Option<Self::Item<'_>>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Item<'w> = ($(&'w $name,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn fetch(record: &EntityComponents) -> Option<Self::Item<'_>> {
                Some(($(record.get::<$name>()?,)+))
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

/// Iterator over every `(entity, &T)` for one component type, in ascending
/// entity order. Created by [`World::get_component`](super::World::get_component).
pub struct ComponentIter<'w, T: Component> {
    records: &'w Records,
    ids: Option<btree_set::Iter<'w, EntityId>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'w, T: Component> ComponentIter<'w, T> {
    pub(crate) fn new(records: &'w Records, ids: Option<&'w BTreeSet<EntityId>>) -> Self {
        Self {
            records,
            ids: ids.map(BTreeSet::iter),
            _marker: PhantomData,
        }
    }
}

impl<'w, T: Component> Clone for ComponentIter<'w, T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records,
            ids: self.ids.clone(),
            _marker: PhantomData,
        }
    }
}

impl<'w, T: Component> Iterator for ComponentIter<'w, T> {
    type Item = (EntityId, &'w T);

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records;
        let ids = self.ids.as_mut()?;
        ids.find_map(|id| {
            records
                .get(id)
                .and_then(|record| record.get::<T>())
                .map(|component| (*id, component))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.ids {
            Some(ids) => ids.size_hint(),
            None => (0, Some(0)),
        }
    }
}

/// Iterator over the entities holding every type in `Q`.
///
/// The smallest index set drives the walk and the remaining sets act as
/// membership filters, so the cost is proportional to the rarest requested
/// type. Entities come out in ascending id order. Created by
/// [`World::get_components`](super::World::get_components).
pub struct Query<'w, Q: ComponentSet> {
    records: &'w Records,
    driver: Option<btree_set::Iter<'w, EntityId>>,
    filters: Vec<&'w BTreeSet<EntityId>>,
    _marker: PhantomData<fn() -> Q>,
}

impl<'w, Q: ComponentSet> Query<'w, Q> {
    /// `sets` holds one index set per requested type, or `None` when at
    /// least one requested type has never been indexed; the intersection
    /// is then empty.
    pub(crate) fn new(records: &'w Records, sets: Option<Vec<&'w BTreeSet<EntityId>>>) -> Self {
        let mut sets = sets.unwrap_or_default();
        sets.sort_by_key(|set| set.len());
        let driver = if sets.is_empty() {
            None
        } else {
            Some(sets.remove(0).iter())
        };
        Self {
            records,
            driver,
            filters: sets,
            _marker: PhantomData,
        }
    }
}

impl<'w, Q: ComponentSet> Clone for Query<'w, Q> {
    fn clone(&self) -> Self {
        Self {
            records: self.records,
            driver: self.driver.clone(),
            filters: self.filters.clone(),
            _marker: PhantomData,
        }
    }
}

impl<'w, Q: ComponentSet> Iterator for Query<'w, Q> {
    type Item = (EntityId, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records;
        let filters = &self.filters;
        let driver = self.driver.as_mut()?;
        driver.find_map(|id| {
            if !filters.iter().all(|set| set.contains(id)) {
                return None;
            }
            records
                .get(id)
                .and_then(|record| Q::fetch(record))
                .map(|item| (*id, item))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.driver {
            Some(driver) => (0, driver.size_hint().1),
            None => (0, Some(0)),
        }
    }
}
