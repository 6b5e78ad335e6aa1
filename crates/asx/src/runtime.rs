//! # ASX Runtime
//!
//! Owns the world, the HUD, the render backend, storage and every handler
//! registry, and drives them one frame at a time.
//!
//! ```text
//!                 ┌────────────── AsxRuntime ───────────────┐
//! host ─frame()─> │ World ─> TickHandlers ─> InputQueue     │
//!      ─click()─> │   │            │            │           │
//!                 │   │        HandlerContext ◄─┘           │
//!                 │   │            │ navigate()             │
//!                 │   ▼            ▼                        │
//!                 │ RenderBackend  PageController ─> HudLayer│
//!                 └─────────────────────────────────────────┘
//! ```
//!
//! Handlers never navigate directly. A request is parked in
//! `pending_route` and applied once the current handler pass ends, so a
//! page is never torn down underneath the handler that asked to leave it.

use std::time::Instant;

use asx_core::World;
use asx_ui::NodeId;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::config::AsxConfig;
use crate::error::{AsxError, AsxResult};
use crate::events::EventEmitter;
use crate::frame::{elapsed_us, FrameStats, FrameStatsAccumulator};
use crate::handler::{HandlerContext, HandlerId};
use crate::hud::HudLayer;
use crate::input::{InputDispatcher, InputEvent, InputQueue, InputSender};
use crate::os::OsDocument;
use crate::page::{BehaviourRegistry, PageController, PageHost};
use crate::renderer::{FrameOutput, RenderBackend, SceneRenderer};
use crate::storage::{JsonFileBackend, KeyValueStore};
use crate::tick::{TickHandlers, TickInfo};

/// Input handler installed by the runtime: `navigate(path)`.
pub const NAVIGATE_INPUT: &str = asx_ui::hud::NAVIGATE;

/// The runtime shell.
pub struct AsxRuntime {
    config: AsxConfig,
    os: OsDocument,
    world: World,
    hud: HudLayer,
    renderer: Box<dyn RenderBackend>,
    pages: PageController,
    input: InputDispatcher,
    queue: InputQueue,
    ticks: TickHandlers,
    events: EventEmitter,
    storage: KeyValueStore,
    pending_route: Option<String>,
    current_route: Option<String>,
    stats: FrameStatsAccumulator,
    last_stats: FrameStats,
    last_output: Option<FrameOutput>,
}

impl AsxRuntime {
    /// Builds a runtime. Nothing is mounted until [`boot`](Self::boot).
    ///
    /// # Errors
    ///
    /// [`AsxError::Config`] for out-of-range settings, [`AsxError::Io`] if
    /// the configured storage file exists but cannot be read.
    pub fn new(config: AsxConfig, os: OsDocument, behaviours: BehaviourRegistry) -> AsxResult<Self> {
        config.validate()?;

        let storage = match &config.storage.path {
            Some(path) => KeyValueStore::new(Box::new(JsonFileBackend::open(path)?), config.storage.prefix.clone()),
            None => KeyValueStore::in_memory(config.storage.prefix.clone()),
        };
        let world = World::with_builtin_systems().with_clock(config.clock.frame_clock());

        let mut input = InputDispatcher::new();
        input.on_input(NAVIGATE_INPUT, |ctx, args| {
            let path = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| AsxError::handler("navigate expects a route path"))?;
            ctx.navigate(path);
            Ok(())
        });

        info!(
            pages = os.pages.len(),
            routes = os.routes.len(),
            behaviours = behaviours.names().len(),
            "runtime created"
        );

        Ok(Self {
            stats: FrameStatsAccumulator::new(config.frame.budget_ms),
            config,
            os,
            world,
            hud: HudLayer::new(),
            renderer: Box::new(SceneRenderer::new()),
            pages: PageController::new(behaviours),
            input,
            queue: InputQueue::default(),
            ticks: TickHandlers::new(),
            events: EventEmitter::new(),
            storage,
            pending_route: None,
            current_route: None,
            last_stats: FrameStats::default(),
            last_output: None,
        })
    }

    /// Replaces the render backend.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn RenderBackend>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the key-value store.
    #[must_use]
    pub fn with_storage(mut self, storage: KeyValueStore) -> Self {
        self.storage = storage;
        self
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Mounts the configured boot route.
    ///
    /// # Errors
    ///
    /// As [`navigate`](Self::navigate).
    pub fn boot(&mut self) -> AsxResult<String> {
        let route = self.config.boot.boot_route.clone();
        info!(route = %route, "booting");
        self.navigate(&route)
    }

    /// Unmounts the current page and mounts the one `path` resolves to.
    ///
    /// On failure the HUD shows the error view.
    ///
    /// # Errors
    ///
    /// [`AsxError::PageNotFound`], [`AsxError::BehaviourNotFound`], a HUD
    /// failure, or whatever the page behaviour returned.
    pub fn navigate(&mut self, path: &str) -> AsxResult<String> {
        self.current_route = Some(path.to_string());
        let Self {
            pages,
            os,
            world,
            hud,
            renderer,
            input,
            ticks,
            events,
            storage,
            ..
        } = self;
        let mut host = PageHost {
            world,
            hud,
            renderer: renderer.as_mut(),
            input,
            ticks,
            events,
            storage,
        };
        pages.navigate(path, os, &mut host)
    }

    fn apply_pending_route(&mut self) {
        if let Some(route) = self.pending_route.take() {
            debug!(route = %route, "applying navigation request");
            // navigate already logs and shows the error view
            let _ = self.navigate(&route);
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Registers a runtime-wide input handler. Page behaviours should use
    /// their context instead so the handler is dropped on unmount.
    pub fn on_input<F>(&mut self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&mut HandlerContext<'_>, &[Value]) -> AsxResult<()> + 'static,
    {
        self.input.on_input(name, handler)
    }

    /// Registers a runtime-wide tick handler.
    pub fn on_tick<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&mut HandlerContext<'_>, TickInfo) -> AsxResult<()> + 'static,
    {
        self.ticks.on_tick(handler)
    }

    /// Dispatches an input immediately, then applies any navigation it
    /// requested.
    ///
    /// # Returns
    ///
    /// Number of handlers invoked.
    pub fn dispatch_input(&mut self, name: &str, args: &[Value]) -> usize {
        let mut ctx = HandlerContext::new(&mut self.world, &self.storage, &mut self.events, &mut self.pending_route);
        let invoked = self.input.dispatch(&mut ctx, name, args);
        self.apply_pending_route();
        invoked
    }

    /// Simulates a click on a HUD node: its `onclick` handler is
    /// dispatched with the `data-arg` value, as a JSON string, when present.
    ///
    /// # Returns
    ///
    /// Number of handlers invoked; 0 when the node has no binding.
    pub fn click(&mut self, node: NodeId) -> usize {
        let Some(binding) = self.hud.click_binding(node) else {
            trace!(node = ?node, "click on unbound node");
            return 0;
        };
        let args: Vec<Value> = binding.arg.into_iter().map(Value::String).collect();
        self.dispatch_input(&binding.handler, &args)
    }

    /// A thread-safe producer for inputs drained on the next frame.
    #[must_use]
    pub fn input_sender(&self) -> InputSender {
        self.queue.sender()
    }

    /// Queues an input for the next frame.
    pub fn queue_input(&self, event: InputEvent) -> bool {
        self.queue.sender().send(event)
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Runs one frame at host time `now_ms`.
    pub fn frame(&mut self, now_ms: f64) -> FrameStats {
        let frame_start = Instant::now();
        let previous_ms = self.world.clock().last_timestamp();

        // 1. world
        let logic_start = Instant::now();
        let report = self.world.advance(now_ms);
        let logic_us = elapsed_us(logic_start);

        // 2. tick handlers
        let tick_start = Instant::now();
        let info = TickInfo {
            delta_ms: now_ms - previous_ms,
            frame: report.frame + 1,
            time_ms: now_ms,
        };
        let mut ctx = HandlerContext::new(&mut self.world, &self.storage, &mut self.events, &mut self.pending_route);
        let handler_failures = self.ticks.run(&mut ctx, info);
        let tick_us = elapsed_us(tick_start);

        // 3-4. queued input, then navigation
        let input_start = Instant::now();
        let queued = self.queue.drain();
        for event in &queued {
            let mut ctx =
                HandlerContext::new(&mut self.world, &self.storage, &mut self.events, &mut self.pending_route);
            self.input.dispatch(&mut ctx, &event.name, &event.args);
        }
        self.apply_pending_route();
        let input_us = elapsed_us(input_start);

        // 5. render
        let render_start = Instant::now();
        self.last_output = self.renderer.render(&self.world);
        let render_us = elapsed_us(render_start);

        let stats = FrameStats {
            frame: info.frame,
            dt: report.dt,
            total_us: elapsed_us(frame_start),
            logic_us,
            tick_us,
            input_us,
            render_us,
            systems_run: report.systems_run,
            system_failures: report.failures.len(),
            handler_failures,
            inputs_dispatched: queued.len(),
            instances: self.last_output.as_ref().map_or(0, |o| o.instances.len()),
        };
        let over_budget = self.stats.record(&stats);
        if over_budget && self.config.frame.warn_slow_frames {
            warn!(
                frame = stats.frame,
                total_ms = stats.total_us as f64 / 1000.0,
                budget_ms = self.config.frame.budget_ms,
                "frame over budget"
            );
        }
        self.last_stats = stats;
        stats
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AsxConfig {
        &self.config
    }

    /// The loaded OS document.
    #[must_use]
    pub fn os(&self) -> &OsDocument {
        &self.os
    }

    /// The simulation.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable simulation access for hosts.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The HUD.
    #[inline]
    #[must_use]
    pub fn hud(&self) -> &HudLayer {
        &self.hud
    }

    /// The render backend.
    #[must_use]
    pub fn renderer(&self) -> &dyn RenderBackend {
        self.renderer.as_ref()
    }

    /// Key-value storage.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &KeyValueStore {
        &self.storage
    }

    /// Application events.
    pub fn events_mut(&mut self) -> &mut EventEmitter {
        &mut self.events
    }

    /// Key of the mounted page.
    #[must_use]
    pub fn current_page(&self) -> Option<&str> {
        self.pages.current()
    }

    /// Route of the last navigation attempt.
    #[must_use]
    pub fn current_route(&self) -> Option<&str> {
        self.current_route.as_deref()
    }

    /// Stats of the last frame.
    #[must_use]
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Output of the last frame; `None` when no scene was loaded.
    #[must_use]
    pub fn last_output(&self) -> Option<&FrameOutput> {
        self.last_output.as_ref()
    }

    /// Statistics over every frame so far.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }
}

impl std::fmt::Debug for AsxRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsxRuntime")
            .field("page", &self.pages.current())
            .field("frame", &self.world.frame())
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asx_core::{Renderable, Transform, Velocity};
    use serde_json::json;

    fn runtime(doc: &str) -> AsxRuntime {
        AsxRuntime::new(
            AsxConfig::default(),
            OsDocument::from_json_str(doc).unwrap(),
            BehaviourRegistry::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_frame_order_and_tick_info() {
        let mut rt = runtime(r#"{"pages": {"home": {"webgl": {"scene": "flat"}}}}"#);
        rt.boot().unwrap();

        let ship = rt.world_mut().create_entity();
        rt.world_mut().insert(ship, Transform::new(0.0, 0.0));
        rt.world_mut().insert(ship, Velocity::new(10.0, 0.0));
        rt.world_mut().insert(ship, Renderable::default());

        rt.on_tick(move |ctx, info| {
            // the world pass already ran this frame
            let x = ctx.world.get::<Transform>(ship).map_or(-1.0, |t| t.x);
            ctx.storage.set(&format!("tick{}", info.frame), &(x, info.delta_ms));
            Ok(())
        });

        let first = rt.frame(16.0);
        let second = rt.frame(116.0);
        assert_eq!((first.frame, second.frame), (1, 2));
        assert_eq!(first.instances, 1);
        let (x1, delta1) = rt.storage().get::<(f32, f64)>("tick1").unwrap();
        assert!((x1 - 0.16).abs() < 1e-5);
        assert_eq!(delta1, 16.0);
        // systems see dt clamped to 0.05; handlers see the raw delta
        let (x2, delta2) = rt.storage().get::<(f32, f64)>("tick2").unwrap();
        assert!((x2 - 0.66).abs() < 1e-5);
        assert_eq!(delta2, 100.0);
        assert!((second.dt - 0.05).abs() < f32::EPSILON);
        assert_eq!(rt.stats().frames_recorded(), 2);
    }

    #[test]
    fn test_queued_input_and_deferred_navigation() {
        let mut rt = runtime(
            r#"{"routes": {"/": "home", "/b": "b"},
                "pages": {"home": {}, "b": {"webgl": {"scene": "space"}}}}"#,
        );
        rt.boot().unwrap();
        assert_eq!(rt.current_page(), Some("home"));

        assert!(rt.input_sender().send(InputEvent::new("navigate", vec![json!("/b")])));
        assert_eq!(rt.current_page(), Some("home"));

        let stats = rt.frame(16.0);
        assert_eq!(stats.inputs_dispatched, 1);
        assert_eq!(rt.current_page(), Some("b"));
        assert_eq!(rt.current_route(), Some("/b"));
        // rendered after the navigation in the same frame
        assert!(rt.last_output().is_some());
    }

    #[test]
    fn test_navigate_without_path_is_contained() {
        let mut rt = runtime(r#"{"pages": {"home": {}}}"#);
        rt.boot().unwrap();
        assert_eq!(rt.dispatch_input("navigate", &[]), 1);
        assert_eq!(rt.current_page(), Some("home"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AsxConfig::default();
        config.frame.budget_ms = 0.0;
        let err = AsxRuntime::new(config, OsDocument::default(), BehaviourRegistry::new()).unwrap_err();
        assert!(matches!(err, AsxError::Config(_)));
    }
}
