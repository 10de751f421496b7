//! Entity management

/// Entity ID type - simple numeric ID
pub type EntityId = u64;

/// Issues entity ids.
///
/// Ids are handed out in strictly increasing order and are never recycled,
/// so a stale id can never alias a newer entity.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    /// `None` once `EntityId::MAX` has been issued.
    next_id: Option<EntityId>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Allocator whose first issued id is `first_id`.
    pub fn starting_at(first_id: EntityId) -> Self {
        Self {
            next_id: Some(first_id),
        }
    }

    /// # Panics
    ///
    /// Panics once every id up to `EntityId::MAX` has been issued, since
    /// wrapping around would hand out ids a second time.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id.expect("entity ids exhausted");
        self.next_id = id.checked_add(1);
        id
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_allocation() {
        let mut allocator = EntityAllocator::new();

        let e1 = allocator.allocate();
        assert_eq!(e1, 0);

        let e2 = allocator.allocate();
        assert_eq!(e2, 1);
    }

    #[test]
    fn test_allocation_with_offset() {
        let mut allocator = EntityAllocator::starting_at(1);

        assert_eq!(allocator.allocate(), 1);
        assert_eq!(allocator.allocate(), 2);
        assert_eq!(allocator.allocate(), 3);
    }

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut allocator = EntityAllocator::new();
        let ids: Vec<_> = (0..100).map(|_| allocator.allocate()).collect();

        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_last_id_is_issued_once() {
        let mut allocator = EntityAllocator::starting_at(EntityId::MAX);

        assert_eq!(allocator.allocate(), EntityId::MAX);
    }

    #[test]
    #[should_panic(expected = "entity ids exhausted")]
    fn test_exhausted_allocator_panics_instead_of_wrapping() {
        let mut allocator = EntityAllocator::starting_at(EntityId::MAX);
        allocator.allocate();
        allocator.allocate();
    }
}
