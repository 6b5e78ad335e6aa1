//! # Query Engine
//!
//! A query is a conjunction of component-presence tests evaluated against
//! the live entity set. Nothing is cached or indexed.
//!
//! Candidates are snapshotted when the query is created and each one is
//! re-checked when it is visited. Systems may therefore create or destroy
//! entities between two visits:
//! - an entity destroyed after the snapshot is skipped
//! - an entity created after the snapshot is not visited

use super::component::{Component, ComponentKind};
use super::entity::EntityId;
use super::world::World;

/// A static set of component kinds, implemented for tuples of components.
///
/// ```rust,ignore
/// for id in world.query::<(Transform, Velocity)>().iter(&world) { /* ... */ }
/// ```
pub trait ComponentSet {
    /// The kinds every matching entity must carry.
    fn kinds() -> Vec<ComponentKind>;
}

macro_rules! impl_component_set {
    ($($c:ident),+) => {
        impl<$($c: Component),+> ComponentSet for ($($c,)+) {
            fn kinds() -> Vec<ComponentKind> {
                vec![$(ComponentKind::of::<$c>()),+]
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

/// A lazily evaluated query over a candidate snapshot.
///
/// The query does not borrow the world, so it can be advanced with
/// [`next_match`](Self::next_match) while the world is mutated in between.
#[derive(Debug, Clone)]
pub struct Query {
    kinds: Vec<ComponentKind>,
    candidates: std::vec::IntoIter<EntityId>,
}

impl Query {
    pub(crate) fn new(kinds: Vec<ComponentKind>, candidates: Vec<EntityId>) -> Self {
        Self {
            kinds,
            candidates: candidates.into_iter(),
        }
    }

    /// Advances to the next candidate that is still live and carries every
    /// kind in the query.
    pub fn next_match(&mut self, world: &World) -> Option<EntityId> {
        self.candidates
            .by_ref()
            .find(|&id| world.matches(id, &self.kinds))
    }

    /// Borrows the world read-only and turns the query into an iterator.
    #[must_use]
    pub fn iter(self, world: &World) -> QueryIter<'_> {
        QueryIter { query: self, world }
    }

    /// Evaluates the remaining candidates eagerly.
    #[must_use]
    pub fn collect_ids(self, world: &World) -> Vec<EntityId> {
        self.iter(world).collect()
    }

    /// The kinds this query tests for.
    #[must_use]
    pub fn kinds(&self) -> &[ComponentKind] {
        &self.kinds
    }

    /// Candidates not yet visited (an upper bound on remaining matches).
    #[must_use]
    pub fn remaining_candidates(&self) -> usize {
        self.candidates.len()
    }
}

/// Read-only iterator over a query's matches.
pub struct QueryIter<'w> {
    query: Query,
    world: &'w World,
}

impl Iterator for QueryIter<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        self.query.next_match(self.world)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.query.remaining_candidates()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Lifetime, Transform, Velocity};

    #[test]
    fn test_query_is_conjunction() {
        let mut world = World::new();
        let both = world.create_entity();
        let only_t = world.create_entity();
        let only_v = world.create_entity();
        world.insert(both, Transform::default());
        world.insert(both, Velocity::default());
        world.insert(only_t, Transform::default());
        world.insert(only_v, Velocity::default());

        let ids = world.query_ids::<(Transform, Velocity)>();
        assert_eq!(ids, vec![both]);
    }

    #[test]
    fn test_query_order_is_creation_order() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        // Insert in reverse; iteration must still follow creation.
        world.insert(c, Transform::default());
        world.insert(b, Transform::default());
        world.insert(a, Transform::default());

        assert_eq!(world.query_ids::<(Transform,)>(), vec![a, b, c]);
    }

    #[test]
    fn test_query_undefined_kind_is_empty() {
        let mut world = World::new();
        let e = world.create_entity();
        world.insert(e, Transform::default());
        assert!(world.query_ids::<(Lifetime,)>().is_empty());
        assert!(world.query_ids::<(Transform, Lifetime)>().is_empty());
    }

    #[test]
    fn test_destroy_during_iteration_skips_entity() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        world.insert(a, Transform::default());
        world.insert(b, Transform::default());

        let mut query = world.query::<(Transform,)>();
        assert_eq!(query.next_match(&world), Some(a));
        world.destroy_entity(b);
        assert_eq!(query.next_match(&world), None);
    }

    #[test]
    fn test_created_during_iteration_not_visited() {
        let mut world = World::new();
        let a = world.create_entity();
        world.insert(a, Transform::default());

        let mut query = world.query::<(Transform,)>();
        let late = world.create_entity();
        world.insert(late, Transform::default());

        assert_eq!(query.next_match(&world), Some(a));
        assert_eq!(query.next_match(&world), None);
    }
}
