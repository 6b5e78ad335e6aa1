//! # Input Dispatch
//!
//! ```text
//! host listener ──send──> InputQueue (crossbeam) ──drain once per frame──┐
//!                                                                        ▼
//! click on bound node ───────────────────────────────────> InputDispatcher
//!                                                     name → [handler, ...]
//! ```
//!
//! Handlers are looked up by name and called with positional JSON
//! arguments. Any thread may enqueue; dispatch happens on the frame thread.

use std::collections::BTreeMap;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::AsxResult;
use crate::handler::{run_isolated, HandlerContext, HandlerId, HandlerIds};

/// Input handler signature.
pub type InputHandler = Box<dyn FnMut(&mut HandlerContext<'_>, &[Value]) -> AsxResult<()>>;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// One queued input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    /// Handler name.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl InputEvent {
    /// Creates an input event.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Named input handlers.
#[derive(Default)]
pub struct InputDispatcher {
    handlers: BTreeMap<String, Vec<(HandlerId, InputHandler)>>,
    ids: HandlerIds,
}

impl InputDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `name`.
    pub fn on_input<F>(&mut self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&mut HandlerContext<'_>, &[Value]) -> AsxResult<()> + 'static,
    {
        let id = self.ids.next();
        self.handlers
            .entry(name.into())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Removes a handler.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(h, _)| *h != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Calls every handler registered under `name`.
    ///
    /// # Returns
    ///
    /// Number of handlers invoked, failed ones included.
    pub fn dispatch(&mut self, ctx: &mut HandlerContext<'_>, name: &str, args: &[Value]) -> usize {
        let Some(list) = self.handlers.get_mut(name) else {
            trace!(input = name, "no input handler");
            return 0;
        };
        for (id, handler) in list.iter_mut() {
            if let Err(err) = run_isolated(|| handler(ctx, args)) {
                warn!(input = name, handler = %id, error = %err, "input handler failed");
            }
        }
        list.len()
    }

    /// Whether anything listens on `name`.
    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl std::fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// QUEUE
// ============================================================================

/// Bounded channel carrying input from host listeners to the frame loop.
pub struct InputQueue {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    /// Creates a queue holding at most `capacity` pending events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A cloneable, thread-safe producer handle.
    #[must_use]
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Takes every pending event.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Producer side of an [`InputQueue`].
#[derive(Clone, Debug)]
pub struct InputSender {
    sender: Sender<InputEvent>,
}

impl InputSender {
    /// Enqueues an event without blocking.
    ///
    /// Returns `false` when the queue is full; the event is dropped.
    pub fn send(&self, event: InputEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(input = %event.name, "input queue full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
