//! # Component Storage
//!
//! Sparse per-kind storage keyed by entity id.
//!
//! - One store per component kind, created on first reference
//! - Records are mutated in place through `get_mut`
//! - Iteration is ordered by entity id, which is creation order

use std::any::Any;
use std::collections::BTreeMap;

use tracing::trace;

use super::component::Component;
use super::entity::{EntityId, EntityRegistry};

/// Type-erased view of a store, so the world can purge a destroyed entity
/// from every kind without knowing the concrete types.
pub(crate) trait ErasedStore {
    /// Removes the entity's record, returning true if one existed.
    fn remove_entity(&mut self, id: EntityId) -> bool;
    /// Checks whether the entity has a record in this store.
    fn contains(&self, id: EntityId) -> bool;
    /// Number of records.
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Storage for a single component kind.
///
/// # Type Parameters
///
/// * `C` - The component type to store
pub struct ComponentStore<C: Component> {
    records: BTreeMap<EntityId, C>,
}

impl<C: Component> ComponentStore<C> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Gets the record for an entity.
    ///
    /// # Returns
    ///
    /// The record, or `None` if the entity has no component of this kind.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&C> {
        self.records.get(&id)
    }

    /// Gets a mutable record for an entity.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.records.get_mut(&id)
    }

    /// Checks whether the entity has a record of this kind.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates all records with their entity ids.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.records.iter().map(|(id, c)| (*id, c))
    }

    /// Iterates all records mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut C)> {
        self.records.iter_mut().map(|(id, c)| (*id, c))
    }

    /// Stores a record, overwriting any previous one. Liveness is the
    /// caller's responsibility.
    pub(crate) fn insert(&mut self, id: EntityId, component: C) -> &mut C {
        use std::collections::btree_map::Entry;
        match self.records.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(component);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(component),
        }
    }

    /// Removes and returns the record for an entity.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<C> {
        self.records.remove(&id)
    }
}

impl<C: Component> Default for ComponentStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> ErasedStore for ComponentStore<C> {
    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.records.remove(&id).is_some()
    }

    fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Handle returned by [`World::define_component`](super::World::define_component).
///
/// Borrows the kind's store together with the entity registry, so records
/// can only be attached to live entities.
pub struct ComponentHandle<'w, C: Component> {
    pub(crate) store: &'w mut ComponentStore<C>,
    pub(crate) entities: &'w EntityRegistry,
}

impl<'w, C: Component> ComponentHandle<'w, C> {
    /// Attaches (or overwrites) the record for `id`.
    ///
    /// # Returns
    ///
    /// A mutable reference to the stored record, or `None` if `id` is not
    /// live, in which case nothing is stored.
    pub fn add(&mut self, id: EntityId, component: C) -> Option<&mut C> {
        if !self.entities.is_live(id) {
            trace!(entity = %id, kind = C::KIND, "add on non-live entity ignored");
            return None;
        }
        Some(self.store.insert(id, component))
    }

    /// Gets the record for `id`, or `None` when absent.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&C> {
        self.store.get(id)
    }

    /// Gets the mutable record for `id`, or `None` when absent.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.store.get_mut(id)
    }

    /// Checks whether `id` has a record of this kind.
    #[must_use]
    pub fn has(&self, id: EntityId) -> bool {
        self.store.contains(id)
    }

    /// Detaches and returns the record for `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<C> {
        self.store.remove(id)
    }

    /// Number of records of this kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if no entity has this kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Iterates records in entity creation order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.store.iter()
    }

    /// The kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        C::KIND
    }
}
