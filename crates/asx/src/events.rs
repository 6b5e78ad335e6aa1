//! # Event Emitter
//!
//! Named application events with JSON payloads. Handlers run in
//! registration order; a failing handler is logged and the rest still run.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{trace, warn};

use crate::error::AsxResult;
use crate::handler::{run_isolated, HandlerId, HandlerIds};

/// Event handler signature.
pub type EventHandler = Box<dyn FnMut(&Value) -> AsxResult<()>>;

/// Publish/subscribe over event names.
#[derive(Default)]
pub struct EventEmitter {
    handlers: BTreeMap<String, Vec<(HandlerId, EventHandler)>>,
    ids: HandlerIds,
}

impl EventEmitter {
    /// Creates an emitter with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `event`.
    pub fn on<F>(&mut self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&Value) -> AsxResult<()> + 'static,
    {
        let id = self.ids.next();
        self.handlers
            .entry(event.into())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Unsubscribes one handler from `event`.
    pub fn off(&mut self, event: &str, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(h, _)| *h != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(event);
        }
        removed
    }

    /// Unsubscribes a handler from whichever event it is registered on.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let event = self
            .handlers
            .iter()
            .find(|(_, list)| list.iter().any(|(h, _)| *h == id))
            .map(|(name, _)| name.clone());
        event.is_some_and(|name| self.off(&name, id))
    }

    /// Calls every handler of `event` with `payload`.
    ///
    /// # Returns
    ///
    /// Number of handlers invoked, failed ones included.
    pub fn emit(&mut self, event: &str, payload: &Value) -> usize {
        let Some(list) = self.handlers.get_mut(event) else {
            trace!(event, "event has no handlers");
            return 0;
        };
        for (id, handler) in list.iter_mut() {
            if let Err(err) = run_isolated(|| handler(payload)) {
                warn!(event, handler = %id, error = %err, "event handler failed");
            }
        }
        list.len()
    }

    /// Number of handlers subscribed to `event`.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("EventEmitter").field("handlers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AsxError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::new();
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            emitter.on("cart", move |payload| {
                seen.borrow_mut().push(format!("{tag}:{}", payload["id"]));
                Ok(())
            });
        }

        assert_eq!(emitter.emit("cart", &json!({ "id": 7 })), 2);
        assert_eq!(*seen.borrow(), vec!["first:7", "second:7"]);
        assert_eq!(emitter.emit("nothing", &Value::Null), 0);
    }

    #[test]
    fn test_failing_handlers_do_not_stop_others() {
        let hits = Rc::new(RefCell::new(0));
        let mut emitter = EventEmitter::new();
        emitter.on("e", |_| Err(AsxError::handler("nope")));
        emitter.on("e", |_| panic!("worse"));
        let counter = Rc::clone(&hits);
        emitter.on("e", move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        assert_eq!(emitter.emit("e", &Value::Null), 3);
        assert_eq!(emitter.emit("e", &Value::Null), 3);
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_off_and_remove() {
        let mut emitter = EventEmitter::new();
        let a = emitter.on("x", |_| Ok(()));
        let b = emitter.on("y", |_| Ok(()));

        assert!(emitter.off("x", a));
        assert!(!emitter.off("x", a));
        assert_eq!(emitter.handler_count("x"), 0);

        assert!(emitter.remove(b));
        assert!(!emitter.remove(b));
        assert_eq!(emitter.handler_count("y"), 0);
    }
}
