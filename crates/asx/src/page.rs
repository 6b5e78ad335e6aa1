//! # Page Controller
//!
//! Mounts and unmounts pages of the OS document.
//!
//! ```text
//! mount(key)
//!   ├─ page missing            → PageNotFound (nothing touched)
//!   ├─ hud      → HudLayer::render_hud
//!   ├─ webgl    → RenderBackend::load_scene
//!   ├─ entities → spawned, owned by the page
//!   └─ asx      → named behaviour runs with a PageContext
//!
//! unmount()
//!   unload scene, clear HUD, then drop everything the page registered:
//!   systems, entities, tick/input/event handlers
//! ```
//!
//! Pages never carry executable code. A page names a behaviour that the
//! host registered up front in a [`BehaviourRegistry`].

use std::collections::BTreeMap;

use asx_core::{EntityId, SystemContext, SystemId, SystemResult, World};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{AsxError, AsxResult};
use crate::events::EventEmitter;
use crate::handler::{run_isolated, HandlerContext, HandlerId};
use crate::hud::HudLayer;
use crate::input::InputDispatcher;
use crate::os::OsDocument;
use crate::renderer::RenderBackend;
use crate::storage::KeyValueStore;
use crate::tick::{TickHandlers, TickInfo};

/// A page behaviour.
pub type Behaviour = Box<dyn Fn(&mut PageContext<'_>) -> AsxResult<()>>;

/// Behaviours by name.
#[derive(Default)]
pub struct BehaviourRegistry {
    behaviours: BTreeMap<String, Behaviour>,
}

impl BehaviourRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a behaviour.
    pub fn register<F>(&mut self, name: impl Into<String>, behaviour: F) -> &mut Self
    where
        F: Fn(&mut PageContext<'_>) -> AsxResult<()> + 'static,
    {
        self.behaviours.insert(name.into(), Box::new(behaviour));
        self
    }

    /// Looks up a behaviour.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Behaviour> {
        self.behaviours.get(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.behaviours.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for BehaviourRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.behaviours.keys()).finish()
    }
}

/// Everything a page registered, released on unmount.
#[derive(Debug, Default)]
struct PageScope {
    systems: Vec<SystemId>,
    entities: Vec<EntityId>,
    ticks: Vec<HandlerId>,
    inputs: Vec<HandlerId>,
    events: Vec<HandlerId>,
}

impl PageScope {
    fn release(&mut self, host: &mut PageHost<'_>) {
        let systems = self.systems.drain(..).filter(|&id| host.world.unregister_system(id)).count();
        let entities = self.entities.drain(..).filter(|&id| host.world.destroy_entity(id)).count();
        for id in self.ticks.drain(..) {
            host.ticks.remove(id);
        }
        for id in self.inputs.drain(..) {
            host.input.remove(id);
        }
        for id in self.events.drain(..) {
            host.events.remove(id);
        }
        debug!(systems, entities, "page scope released");
    }
}

/// The runtime parts a page touches while mounting and unmounting.
pub struct PageHost<'a> {
    /// The simulation.
    pub world: &'a mut World,
    /// HUD surface.
    pub hud: &'a mut HudLayer,
    /// Render backend.
    pub renderer: &'a mut dyn RenderBackend,
    /// Input handlers.
    pub input: &'a mut InputDispatcher,
    /// Tick handlers.
    pub ticks: &'a mut TickHandlers,
    /// Application events.
    pub events: &'a mut EventEmitter,
    /// Key-value storage.
    pub storage: &'a KeyValueStore,
}

/// Handed to a behaviour while its page mounts.
///
/// Registrations made through the context belong to the page and are
/// released when it unmounts. Direct `world` access is not tracked.
pub struct PageContext<'a> {
    page: &'a str,
    data: &'a Value,
    /// The simulation.
    pub world: &'a mut World,
    /// Key-value storage.
    pub storage: &'a KeyValueStore,
    events: &'a mut EventEmitter,
    input: &'a mut InputDispatcher,
    ticks: &'a mut TickHandlers,
    scope: &'a mut PageScope,
}

impl PageContext<'_> {
    /// Key of the page being mounted.
    #[must_use]
    pub fn page(&self) -> &str {
        self.page
    }

    /// The page's `asx.data` value.
    #[must_use]
    pub fn data(&self) -> &Value {
        self.data
    }

    /// Creates an entity owned by the page.
    pub fn spawn(&mut self) -> EntityId {
        let id = self.world.create_entity();
        self.scope.entities.push(id);
        id
    }

    /// Registers a system owned by the page.
    pub fn register_system<F>(&mut self, name: &'static str, order: i32, system: F) -> SystemId
    where
        F: FnMut(&mut SystemContext<'_>) -> SystemResult + 'static,
    {
        let id = self.world.register_system(name, order, system);
        self.scope.systems.push(id);
        id
    }

    /// Registers a tick handler owned by the page.
    pub fn on_tick<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&mut HandlerContext<'_>, TickInfo) -> AsxResult<()> + 'static,
    {
        let id = self.ticks.on_tick(handler);
        self.scope.ticks.push(id);
        id
    }

    /// Registers an input handler owned by the page.
    pub fn on_input<F>(&mut self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&mut HandlerContext<'_>, &[Value]) -> AsxResult<()> + 'static,
    {
        let id = self.input.on_input(name, handler);
        self.scope.inputs.push(id);
        id
    }

    /// Subscribes to an application event for the page's lifetime.
    pub fn on<F>(&mut self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&Value) -> AsxResult<()> + 'static,
    {
        let id = self.events.on(event, handler);
        self.scope.events.push(id);
        id
    }

    /// Emits an application event.
    pub fn emit(&mut self, event: &str, payload: &Value) -> usize {
        self.events.emit(event, payload)
    }
}

/// Tracks the mounted page and what it owns.
#[derive(Debug, Default)]
pub struct PageController {
    behaviours: BehaviourRegistry,
    current: Option<String>,
    scope: PageScope,
}

impl PageController {
    /// Creates a controller over a behaviour registry.
    #[must_use]
    pub fn new(behaviours: BehaviourRegistry) -> Self {
        Self {
            behaviours,
            ..Self::default()
        }
    }

    /// Key of the mounted page.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Registered behaviours.
    #[must_use]
    pub fn behaviours(&self) -> &BehaviourRegistry {
        &self.behaviours
    }

    /// Mounts the page stored under `key`.
    ///
    /// Anything registered before a failure stays owned by the page scope
    /// and is released by the next [`unmount`](Self::unmount).
    ///
    /// # Errors
    ///
    /// - [`AsxError::PageNotFound`] if the document has no such page
    /// - [`AsxError::BehaviourNotFound`] if the page names an unknown behaviour
    /// - [`AsxError::Ui`] if the HUD cannot be rendered
    /// - whatever the behaviour returns, or [`AsxError::Panicked`]
    pub fn mount(&mut self, key: &str, os: &OsDocument, host: &mut PageHost<'_>) -> AsxResult<()> {
        let page = os.page(key).ok_or_else(|| AsxError::PageNotFound(key.to_string()))?;

        if let Some(hud) = &page.hud {
            host.hud.render_hud(hud)?;
        }
        if let Some(scene) = &page.webgl {
            host.renderer.load_scene(scene);
        }
        for spec in &page.entities {
            let id = spec.spawn(host.world);
            self.scope.entities.push(id);
        }

        if let Some(script) = &page.asx {
            if let Some(name) = &script.behaviour {
                let behaviour = self
                    .behaviours
                    .get(name)
                    .ok_or_else(|| AsxError::BehaviourNotFound(name.clone()))?;
                let mut ctx = PageContext {
                    page: key,
                    data: &script.data,
                    world: host.world,
                    storage: host.storage,
                    events: host.events,
                    input: host.input,
                    ticks: host.ticks,
                    scope: &mut self.scope,
                };
                run_isolated(|| behaviour(&mut ctx))?;
            } else if script.inline.is_some() {
                warn!(page = key, "inline page scripts are not executed; name a behaviour instead");
            }
        }

        self.current = Some(key.to_string());
        info!(page = key, "page mounted");
        Ok(())
    }

    /// Unloads the scene, clears the HUD and releases everything the
    /// current page registered.
    pub fn unmount(&mut self, host: &mut PageHost<'_>) {
        host.renderer.unload();
        if let Err(err) = host.hud.clear() {
            warn!(error = %err, "hud could not be cleared");
        }
        self.scope.release(host);
        if let Some(page) = self.current.take() {
            debug!(page = %page, "page unmounted");
        }
    }

    /// Unmounts the current page, resolves `path` and mounts the result.
    ///
    /// On failure the HUD shows the error view and the error is returned.
    ///
    /// # Errors
    ///
    /// As [`mount`](Self::mount).
    pub fn navigate(&mut self, path: &str, os: &OsDocument, host: &mut PageHost<'_>) -> AsxResult<String> {
        self.unmount(host);
        let key = os.route_to_key(path).to_string();
        match self.mount(&key, os, host) {
            Ok(()) => Ok(key),
            Err(err) => {
                error!(route = path, page = %key, error = %err, "page failed to mount");
                if let Err(ui) = host.hud.show_error(&err.to_string()) {
                    error!(error = %ui, "error view could not be shown");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::SceneRenderer;
    use asx_core::{Transform, Velocity};

    struct Parts {
        world: World,
        hud: HudLayer,
        renderer: SceneRenderer,
        input: InputDispatcher,
        ticks: TickHandlers,
        events: EventEmitter,
        storage: KeyValueStore,
    }

    impl Parts {
        fn new() -> Self {
            Self {
                world: World::new(),
                hud: HudLayer::new(),
                renderer: SceneRenderer::new(),
                input: InputDispatcher::new(),
                ticks: TickHandlers::new(),
                events: EventEmitter::new(),
                storage: KeyValueStore::in_memory("t:"),
            }
        }

        fn host(&mut self) -> PageHost<'_> {
            PageHost {
                world: &mut self.world,
                hud: &mut self.hud,
                renderer: &mut self.renderer,
                input: &mut self.input,
                ticks: &mut self.ticks,
                events: &mut self.events,
                storage: &self.storage,
            }
        }
    }

    fn document() -> OsDocument {
        OsDocument::from_json_str(
            r#"{
                "meta": { "boot": "home" },
                "routes": { "/": "home", "/game": "game", "/broken": "broken" },
                "pages": {
                    "home": { "hud": { "content": { "type": "menu", "items": [
                        { "title": "Play", "link": "/game" } ] } } },
                    "game": {
                        "webgl": { "scene": "space" },
                        "asx": { "behaviour": "game", "data": { "speed": 4 } },
                        "entities": [ { "transform": { "x": 0, "y": 0 } } ]
                    },
                    "broken": { "asx": { "behaviour": "missing" } }
                }
            }"#,
        )
        .unwrap()
    }

    fn registry() -> BehaviourRegistry {
        let mut registry = BehaviourRegistry::new();
        registry.register("game", |ctx| {
            let speed = ctx.data()["speed"].as_f64().unwrap_or(1.0) as f32;
            let ship = ctx.spawn();
            ctx.world.insert(ship, Transform::new(0.0, 0.0));
            ctx.world.insert(ship, Velocity::new(speed, 0.0));
            ctx.register_system("drift", 5, |_| Ok(()));
            ctx.on_tick(|_, _| Ok(()));
            ctx.on_input("fire", |_, _| Ok(()));
            ctx.on("score", |_| Ok(()));
            Ok(())
        });
        registry
    }

    #[test]
    fn test_mount_runs_every_section() {
        let os = document();
        let mut parts = Parts::new();
        let mut pages = PageController::new(registry());

        pages.mount("game", &os, &mut parts.host()).unwrap();
        assert_eq!(pages.current(), Some("game"));
        assert!(parts.renderer.has_scene());
        assert_eq!(parts.world.entity_count(), 2);
        assert_eq!(parts.world.systems().names(), vec!["drift"]);
        assert_eq!(parts.ticks.len(), 1);
        assert!(parts.input.has_handler("fire"));
        assert_eq!(parts.events.handler_count("score"), 1);
    }

    #[test]
    fn test_unmount_releases_page_scope() {
        let os = document();
        let mut parts = Parts::new();
        let mut pages = PageController::new(registry());
        let survivor = parts.world.create_entity();

        pages.mount("game", &os, &mut parts.host()).unwrap();
        pages.unmount(&mut parts.host());

        assert_eq!(pages.current(), None);
        assert!(!parts.renderer.has_scene());
        assert!(parts.hud.is_empty());
        assert_eq!(parts.world.entities().collect::<Vec<_>>(), vec![survivor]);
        assert!(parts.world.systems().is_empty());
        assert!(parts.ticks.is_empty());
        assert!(!parts.input.has_handler("fire"));
        assert_eq!(parts.events.handler_count("score"), 0);
    }

    #[test]
    fn test_missing_page_fails_fast() {
        let os = document();
        let mut parts = Parts::new();
        let mut pages = PageController::new(registry());
        let err = pages.mount("nowhere", &os, &mut parts.host()).unwrap_err();
        assert!(matches!(err, AsxError::PageNotFound(ref k) if k == "nowhere"));
        assert!(parts.hud.is_empty());
        assert_eq!(pages.current(), None);
    }

    #[test]
    fn test_navigate_failure_shows_error_view() {
        let os = document();
        let mut parts = Parts::new();
        let mut pages = PageController::new(registry());

        assert_eq!(pages.navigate("/", &os, &mut parts.host()).unwrap(), "home");
        assert!(parts.hud.text().contains("Play"));

        let err = pages.navigate("/broken", &os, &mut parts.host()).unwrap_err();
        assert!(matches!(err, AsxError::BehaviourNotFound(_)));
        assert!(parts.hud.text().contains("ERROR"));
        assert!(parts.hud.text().contains("Behaviour not found: missing"));
        assert_eq!(pages.current(), None);
    }

    #[test]
    fn test_unknown_route_falls_back_to_boot() {
        let os = document();
        let mut parts = Parts::new();
        let mut pages = PageController::new(registry());
        assert_eq!(pages.navigate("/does-not-exist", &os, &mut parts.host()).unwrap(), "home");
    }

    #[test]
    fn test_behaviour_panic_is_reported() {
        let mut registry = BehaviourRegistry::new();
        registry.register("bad", |_| panic!("behaviour exploded"));
        let os = OsDocument::from_json_str(r#"{"pages": {"p": {"asx": {"behaviour": "bad"}}}}"#).unwrap();
        let mut parts = Parts::new();
        let mut pages = PageController::new(registry);

        let err = pages.mount("p", &os, &mut parts.host()).unwrap_err();
        assert_eq!(err.to_string(), "handler panicked: behaviour exploded");
    }
}
