//! # Entity Management
//!
//! Entities are opaque keys. They carry no data and no generation counter:
//! ids are handed out from a counter that starts at 1 and only ever grows,
//! so a destroyed id can never alias a newer entity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an entity within one [`World`](super::World).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw id value.
    ///
    /// Mostly useful for tests and for ids coming back from a host; ids
    /// produced by an [`EntityRegistry`] are always non-zero.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocates and retires entity ids.
///
/// The live set is ordered, so iterating it yields entities in creation
/// order. Query evaluation relies on that.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    /// Next id to hand out.
    next_id: u64,
    /// Ids created and not yet destroyed.
    live: BTreeSet<EntityId>,
}

impl EntityRegistry {
    /// Creates an empty registry whose first id will be 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            live: BTreeSet::new(),
        }
    }

    /// Allocates the next unused id and marks it live.
    pub fn create(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    /// Retires an id.
    ///
    /// # Returns
    ///
    /// `true` if the id was live. Unknown or already destroyed ids are a
    /// silent no-op and return `false`.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        self.live.remove(&id)
    }

    /// Checks whether an id is currently live.
    #[inline]
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.live.contains(&id)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns true if no entity is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Iterates live ids in creation order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.iter().copied()
    }

    /// Copies the live ids, in creation order, into a fresh vector.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntityId> {
        self.live.iter().copied().collect()
    }

    /// The id the next call to [`create`](Self::create) will return.
    #[inline]
    #[must_use]
    pub const fn peek_next(&self) -> EntityId {
        EntityId(self.next_id)
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_id_is_one() {
        let mut registry = EntityRegistry::new();
        assert_eq!(registry.create().raw(), 1);
        assert_eq!(registry.create().raw(), 2);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut registry = EntityRegistry::new();
        let a = registry.create();
        assert!(registry.destroy(a));
        let b = registry.create();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut registry = EntityRegistry::new();
        let a = registry.create();
        assert!(registry.destroy(a));
        assert!(!registry.destroy(a));
        assert!(!registry.destroy(EntityId::from_raw(999)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_iteration_follows_creation_order() {
        let mut registry = EntityRegistry::new();
        let ids: Vec<_> = (0..5).map(|_| registry.create()).collect();
        registry.destroy(ids[2]);
        let live: Vec<_> = registry.iter().collect();
        assert_eq!(live, vec![ids[0], ids[1], ids[3], ids[4]]);
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId::from_raw(7).to_string(), "#7");
    }
}
