//! # World
//!
//! The aggregate simulation unit. Owns:
//! - the entity registry (id counter + live set)
//! - one component store per kind, created on first reference
//! - the ordered system list
//! - the frame clock
//!
//! There is no global state: every world is independent, so tests can run
//! several side by side.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::clock::FrameClock;
use crate::error::{SystemError, SystemResult};

use super::builtin;
use super::component::{Component, ComponentKind};
use super::entity::{EntityId, EntityRegistry};
use super::query::{ComponentSet, Query};
use super::storage::{ComponentHandle, ComponentStore, ErasedStore};
use super::system::{FrameReport, SystemContext, SystemFailure, SystemId, SystemScheduler};

type StoreMap = HashMap<TypeId, Box<dyn ErasedStore>>;

/// Returns the store for `C`, creating it on first reference.
fn store_entry<C: Component>(stores: &mut StoreMap) -> &mut ComponentStore<C> {
    let slot = stores.entry(TypeId::of::<C>()).or_insert_with(|| {
        debug!(kind = C::KIND, "component store created");
        Box::new(ComponentStore::<C>::new())
    });
    let Some(store) = slot.as_any_mut().downcast_mut::<ComponentStore<C>>() else {
        unreachable!("store for {} is keyed by its own TypeId", C::KIND)
    };
    store
}

/// The ECS world.
pub struct World {
    entities: EntityRegistry,
    stores: StoreMap,
    systems: SystemScheduler,
    clock: FrameClock,
    frame: u64,
}

impl World {
    /// Creates an empty world with no systems and a clock starting at `0.0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: EntityRegistry::new(),
            stores: HashMap::new(),
            systems: SystemScheduler::new(),
            clock: FrameClock::new(),
            frame: 0,
        }
    }

    /// Creates a world with the motion and lifetime systems installed.
    #[must_use]
    pub fn with_builtin_systems() -> Self {
        let mut world = Self::new();
        builtin::install(&mut world);
        world
    }

    /// Replaces the frame clock.
    #[must_use]
    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Allocates a new entity.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.entities.create();
        trace!(entity = %id, "entity created");
        id
    }

    /// Destroys an entity and drops its record from every store.
    ///
    /// # Returns
    ///
    /// `true` if the entity was live. Unknown or already destroyed ids are
    /// a no-op.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.entities.destroy(id) {
            return false;
        }
        let purged = self
            .stores
            .values_mut()
            .map(|store| store.remove_entity(id))
            .filter(|&removed| removed)
            .count();
        trace!(entity = %id, purged, "entity destroyed");
        true
    }

    /// Checks whether an entity is live.
    #[inline]
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.is_live(id)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Returns a handle to the store for `C`, creating the store if absent.
    pub fn define_component<C: Component>(&mut self) -> ComponentHandle<'_, C> {
        ComponentHandle {
            store: store_entry::<C>(&mut self.stores),
            entities: &self.entities,
        }
    }

    /// Read access to the store for `C`, if it has been defined.
    #[must_use]
    pub fn component<C: Component>(&self) -> Option<&ComponentStore<C>> {
        self.stores
            .get(&TypeId::of::<C>())
            .and_then(|store| store.as_any().downcast_ref::<ComponentStore<C>>())
    }

    fn component_mut<C: Component>(&mut self) -> Option<&mut ComponentStore<C>> {
        self.stores
            .get_mut(&TypeId::of::<C>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<C>>())
    }

    /// Attaches (or overwrites) a component on a live entity.
    ///
    /// # Returns
    ///
    /// The stored record, or `None` if `id` is not live.
    pub fn insert<C: Component>(&mut self, id: EntityId, component: C) -> Option<&mut C> {
        let store = store_entry::<C>(&mut self.stores);
        if !self.entities.is_live(id) {
            trace!(entity = %id, kind = C::KIND, "insert on non-live entity ignored");
            return None;
        }
        Some(store.insert(id, component))
    }

    /// Gets a component, or `None` when the entity does not carry it.
    #[must_use]
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.component::<C>().and_then(|store| store.get(id))
    }

    /// Gets a component mutably.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        self.component_mut::<C>().and_then(|store| store.get_mut(id))
    }

    /// Gets a component that a system cannot proceed without.
    ///
    /// # Errors
    ///
    /// [`SystemError::MissingComponent`] when the record is absent.
    pub fn require<C: Component>(&self, id: EntityId) -> Result<&C, SystemError> {
        self.get::<C>(id).ok_or(SystemError::MissingComponent {
            entity: id,
            kind: C::KIND,
        })
    }

    /// Checks whether an entity carries `C`.
    #[must_use]
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.has_kind(ComponentKind::of::<C>(), id)
    }

    /// Checks whether an entity carries a component of a runtime kind.
    #[must_use]
    pub fn has_kind(&self, kind: ComponentKind, id: EntityId) -> bool {
        self.stores
            .get(&kind.type_id())
            .is_some_and(|store| store.contains(id))
    }

    /// Detaches and returns a component.
    pub fn remove<C: Component>(&mut self, id: EntityId) -> Option<C> {
        self.component_mut::<C>().and_then(|store| store.remove(id))
    }

    /// Number of records of a kind (0 if the kind was never defined).
    #[must_use]
    pub fn count_kind(&self, kind: ComponentKind) -> usize {
        self.stores.get(&kind.type_id()).map_or(0, |store| store.len())
    }

    /// Live and carrying every kind. Used by queries at visit time.
    pub(crate) fn matches(&self, id: EntityId, kinds: &[ComponentKind]) -> bool {
        self.entities.is_live(id) && kinds.iter().all(|&kind| self.has_kind(kind, id))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Starts a query for entities carrying every component in `Q`.
    #[must_use]
    pub fn query<Q: ComponentSet>(&self) -> Query {
        self.query_kinds(&Q::kinds())
    }

    /// Starts a query over runtime kinds.
    #[must_use]
    pub fn query_kinds(&self, kinds: &[ComponentKind]) -> Query {
        Query::new(kinds.to_vec(), self.entities.snapshot())
    }

    /// Evaluates a query eagerly.
    #[must_use]
    pub fn query_ids<Q: ComponentSet>(&self) -> Vec<EntityId> {
        self.query::<Q>().collect_ids(self)
    }

    // ========================================================================
    // Systems
    // ========================================================================

    /// Registers a per-frame system.
    ///
    /// # Arguments
    ///
    /// * `name` - Label used in logs and failure reports
    /// * `order` - Lower runs first; ties run in registration order
    /// * `system` - The callback
    pub fn register_system<F>(&mut self, name: impl Into<Cow<'static, str>>, order: i32, system: F) -> SystemId
    where
        F: FnMut(&mut SystemContext<'_>) -> SystemResult + 'static,
    {
        let name = name.into();
        debug!(system = %name, order, "system registered");
        self.systems.register(name, order, system)
    }

    /// Removes a system. It never runs again, even later in the current pass.
    pub fn unregister_system(&mut self, id: SystemId) -> bool {
        let removed = self.systems.unregister(id);
        if removed {
            debug!(system = %id, "system unregistered");
        }
        removed
    }

    /// The system list.
    #[must_use]
    pub fn systems(&self) -> &SystemScheduler {
        &self.systems
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Runs one frame: ticks the clock, then every system in order.
    ///
    /// Faults inside systems are isolated, logged and returned in the
    /// report; they never abort the pass.
    ///
    /// # Arguments
    ///
    /// * `now_ms` - Host timestamp in monotonic milliseconds
    pub fn advance(&mut self, now_ms: f64) -> FrameReport {
        if self.systems.is_running() {
            warn!(frame = self.frame, "advance called from inside a system pass, ignored");
            return FrameReport {
                frame: self.frame,
                ..FrameReport::default()
            };
        }

        let dt = self.clock.tick(now_ms);
        let frame = self.frame;
        let mut report = FrameReport {
            frame,
            dt,
            ..FrameReport::default()
        };

        let mut entries = self.systems.begin_pass();
        for entry in &mut entries {
            if self.systems.is_cancelled(entry.id) {
                continue;
            }
            let mut ctx = SystemContext { dt, frame, world: self };
            let outcome = entry.run_isolated(&mut ctx);
            report.systems_run += 1;

            if let Err(err) = outcome {
                match &err {
                    SystemError::Panicked(message) => {
                        error!(system = %entry.name, frame, panic = %message, "system panicked");
                    }
                    other => warn!(system = %entry.name, frame, error = %other, "system failed"),
                }
                report.failures.push(SystemFailure {
                    system: entry.id,
                    name: entry.name.to_string(),
                    error: err,
                });
            }
        }
        self.systems.end_pass(entries);
        self.frame += 1;
        report
    }

    /// Number of completed frames.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// The frame clock.
    #[must_use]
    pub const fn clock(&self) -> &FrameClock {
        &self.clock
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("stores", &self.stores.len())
            .field("systems", &self.systems)
            .field("clock", &self.clock)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ecs::component::{Lifetime, Renderable, Transform, Velocity};

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(log: &Log, label: &'static str) -> impl FnMut(&mut SystemContext<'_>) -> SystemResult {
        let log = Rc::clone(log);
        move |_| {
            log.borrow_mut().push(label);
            Ok(())
        }
    }

    #[test]
    fn test_destroy_purges_every_store() {
        let mut world = World::new();
        let e = world.create_entity();
        world.insert(e, Transform::new(1.0, 2.0));
        world.insert(e, Velocity::new(3.0, 4.0));
        world.insert(e, Renderable::default());

        assert!(world.destroy_entity(e));
        assert!(!world.has::<Transform>(e));
        assert!(!world.has::<Velocity>(e));
        assert!(!world.has::<Renderable>(e));
        assert_eq!(world.count_kind(ComponentKind::of::<Transform>()), 0);
        assert!(world.query_ids::<(Transform, Velocity)>().is_empty());
    }

    #[test]
    fn test_destroy_unknown_is_noop() {
        let mut world = World::new();
        let e = world.create_entity();
        assert!(world.destroy_entity(e));
        assert!(!world.destroy_entity(e));
        assert!(!world.destroy_entity(EntityId::from_raw(1234)));
    }

    #[test]
    fn test_insert_on_destroyed_entity_stores_nothing() {
        let mut world = World::new();
        let e = world.create_entity();
        world.destroy_entity(e);
        assert!(world.insert(e, Transform::default()).is_none());
        assert!(world.define_component::<Velocity>().add(e, Velocity::default()).is_none());
        assert_eq!(world.count_kind(ComponentKind::of::<Transform>()), 0);
    }

    #[test]
    fn test_define_component_handle() {
        let mut world = World::new();
        let e = world.create_entity();
        let mut handle = world.define_component::<Transform>();
        assert_eq!(handle.kind(), "Transform");
        assert!(handle.get(e).is_none());
        handle.add(e, Transform::new(1.0, 1.0));
        if let Some(t) = handle.get_mut(e) {
            t.x = 5.0;
        }
        assert_eq!(handle.get(e), Some(&Transform::new(5.0, 1.0)));
        assert_eq!(handle.remove(e), Some(Transform::new(5.0, 1.0)));
        assert!(!handle.has(e));
    }

    #[test]
    fn test_in_place_mutation_visible() {
        let mut world = World::new();
        let e = world.create_entity();
        world.insert(e, Lifetime::new(1.0));
        if let Some(l) = world.get_mut::<Lifetime>(e) {
            l.age = 0.25;
        }
        assert_eq!(world.get::<Lifetime>(e).map(|l| l.age), Some(0.25));
    }

    #[test]
    fn test_require_reports_missing() {
        let mut world = World::new();
        let e = world.create_entity();
        let err = world.require::<Velocity>(e).unwrap_err();
        assert_eq!(
            err,
            SystemError::MissingComponent {
                entity: e,
                kind: "Velocity"
            }
        );
    }

    #[test]
    fn test_systems_run_by_order_then_registration() {
        let log: Log = Rc::default();
        let mut world = World::new();
        world.register_system("twenty", 20, recorder(&log, "20"));
        world.register_system("ten-a", 10, recorder(&log, "10a"));
        world.register_system("ten-b", 10, recorder(&log, "10b"));

        world.advance(16.0);
        assert_eq!(*log.borrow(), vec!["10a", "10b", "20"]);
    }

    #[test]
    fn test_failing_and_panicking_systems_are_isolated() {
        let log: Log = Rc::default();
        let mut world = World::new();
        world.register_system("err", 0, |_| Err(SystemError::failed("nope")));
        world.register_system("panic", 1, |_| panic!("kaboom"));
        world.register_system("after", 2, recorder(&log, "after"));

        let report = world.advance(16.0);
        assert_eq!(report.systems_run, 3);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].name, "err");
        assert_eq!(report.failures[1].error, SystemError::Panicked("kaboom".into()));

        world.advance(32.0);
        assert_eq!(*log.borrow(), vec!["after", "after"]);
    }

    #[test]
    fn test_unregister_from_inside_pass() {
        let log: Log = Rc::default();
        let mut world = World::new();
        let victim = Rc::new(RefCell::new(None::<SystemId>));
        let target = Rc::clone(&victim);
        world.register_system("killer", 0, move |ctx| {
            if let Some(id) = target.borrow_mut().take() {
                ctx.world.unregister_system(id);
            }
            Ok(())
        });
        let id = world.register_system("victim", 1, recorder(&log, "victim"));
        *victim.borrow_mut() = Some(id);

        let report = world.advance(16.0);
        assert_eq!(report.systems_run, 1);
        world.advance(32.0);
        assert!(log.borrow().is_empty());
        assert_eq!(world.systems().names(), vec!["killer"]);
    }

    #[test]
    fn test_registered_mid_pass_runs_next_frame() {
        let log: Log = Rc::default();
        let mut world = World::new();
        let spawn_log = Rc::clone(&log);
        let mut spawned = false;
        world.register_system("spawner", 0, move |ctx| {
            if !spawned {
                spawned = true;
                ctx.world.register_system("late", -1, recorder(&spawn_log, "late"));
            }
            Ok(())
        });

        world.advance(16.0);
        assert!(log.borrow().is_empty());
        world.advance(32.0);
        assert_eq!(*log.borrow(), vec!["late"]);
        assert_eq!(world.systems().names(), vec!["late", "spawner"]);
    }

    #[test]
    fn test_report_carries_dt_and_frame() {
        let mut world = World::new().with_clock(FrameClock::starting_at(1000.0));
        let report = world.advance(1200.0);
        assert_eq!(report.frame, 0);
        assert!((report.dt - 0.05).abs() < f32::EPSILON);
        assert!(report.is_clean());
        assert_eq!(world.advance(1210.0).frame, 1);
        assert_eq!(world.frame(), 2);
    }
}
