//! # Handlers
//!
//! Shared plumbing for tick, input and event handlers: ids, the context
//! handed to tick and input handlers, and the fault-isolation wrapper.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use asx_core::{panic_message, World};

use crate::error::{AsxError, AsxResult};
use crate::events::EventEmitter;
use crate::storage::KeyValueStore;

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Raw sequence number.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Hands out increasing [`HandlerId`]s.
#[derive(Debug, Default)]
pub(crate) struct HandlerIds(u64);

impl HandlerIds {
    pub(crate) fn next(&mut self) -> HandlerId {
        self.0 += 1;
        HandlerId(self.0)
    }
}

/// What tick and input handlers may touch.
pub struct HandlerContext<'a> {
    /// The simulation.
    pub world: &'a mut World,
    /// Persistent key-value storage.
    pub storage: &'a KeyValueStore,
    /// Application events.
    pub events: &'a mut EventEmitter,
    pending_route: &'a mut Option<String>,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        storage: &'a KeyValueStore,
        events: &'a mut EventEmitter,
        pending_route: &'a mut Option<String>,
    ) -> Self {
        Self {
            world,
            storage,
            events,
            pending_route,
        }
    }

    /// Requests navigation to `path` once the current handler pass ends.
    /// The last request wins.
    pub fn navigate(&mut self, path: impl Into<String>) {
        *self.pending_route = Some(path.into());
    }

    /// The pending navigation request, if any.
    #[must_use]
    pub fn pending_route(&self) -> Option<&str> {
        self.pending_route.as_deref()
    }
}

/// Runs a handler, turning a panic into [`AsxError::Panicked`].
///
/// # Errors
///
/// Whatever the handler returns, or [`AsxError::Panicked`].
pub fn run_isolated<F>(handler: F) -> AsxResult<()>
where
    F: FnOnce() -> AsxResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(handler)) {
        Ok(result) => result,
        Err(payload) => Err(AsxError::Panicked(panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let mut ids = HandlerIds::default();
        let a = ids.next();
        let b = ids.next();
        assert!(a < b);
        assert_eq!(a.to_string(), "handler#1");
    }

    #[test]
    fn test_run_isolated() {
        assert!(run_isolated(|| Ok(())).is_ok());
        assert!(matches!(run_isolated(|| Err(AsxError::handler("no"))), Err(AsxError::Handler(_))));

        let err = run_isolated(|| panic!("handler exploded")).unwrap_err();
        assert_eq!(err.to_string(), "handler panicked: handler exploded");
    }

    #[test]
    fn test_navigate_last_request_wins() {
        let mut world = World::new();
        let storage = KeyValueStore::in_memory("t:");
        let mut events = EventEmitter::new();
        let mut route = None;
        let mut ctx = HandlerContext::new(&mut world, &storage, &mut events, &mut route);
        ctx.navigate("/a");
        ctx.navigate("/b");
        assert_eq!(ctx.pending_route(), Some("/b"));
        assert_eq!(route.as_deref(), Some("/b"));
    }
}
