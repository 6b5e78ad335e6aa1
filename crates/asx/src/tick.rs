//! Per-frame tick handlers, run after the world pass.

use tracing::warn;

use crate::error::AsxResult;
use crate::handler::{run_isolated, HandlerContext, HandlerId, HandlerIds};

/// Timing handed to tick handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInfo {
    /// Milliseconds since the previous frame, unclamped.
    pub delta_ms: f64,
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Host timestamp of this frame.
    pub time_ms: f64,
}

/// Tick handler signature.
pub type TickHandler = Box<dyn FnMut(&mut HandlerContext<'_>, TickInfo) -> AsxResult<()>>;

/// Ordered tick handlers.
#[derive(Default)]
pub struct TickHandlers {
    handlers: Vec<(HandlerId, TickHandler)>,
    ids: HandlerIds,
}

impl TickHandlers {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn on_tick<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&mut HandlerContext<'_>, TickInfo) -> AsxResult<()> + 'static,
    {
        let id = self.ids.next();
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != id);
        self.handlers.len() != before
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every handler in registration order.
    ///
    /// # Returns
    ///
    /// Number of handlers that failed.
    pub fn run(&mut self, ctx: &mut HandlerContext<'_>, info: TickInfo) -> usize {
        let mut failures = 0;
        for (id, handler) in &mut self.handlers {
            if let Err(err) = run_isolated(|| handler(ctx, info)) {
                warn!(handler = %id, frame = info.frame, error = %err, "tick handler failed");
                failures += 1;
            }
        }
        failures
    }
}

impl std::fmt::Debug for TickHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandlers").field("len", &self.handlers.len()).finish()
    }
}
