//! # System Scheduler
//!
//! Holds the ordered list of per-frame callbacks.
//!
//! Ordering key is `(order, registration sequence)`: lower orders run
//! first and systems that share an order run in the order they were
//! registered. Every call goes through a fault-isolation wrapper, so a
//! failing or panicking system never stops the rest of the pass.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{SystemError, SystemResult};

use super::world::World;

/// Boxed per-frame callback.
pub type BoxedSystem = Box<dyn FnMut(&mut SystemContext<'_>) -> SystemResult>;

/// What a system sees while it runs.
pub struct SystemContext<'w> {
    /// Clamped frame delta in seconds.
    pub dt: f32,
    /// Frame number of the pass (starts at 0).
    pub frame: u64,
    /// The world the system is registered against.
    pub world: &'w mut World,
}

/// Handle for a registered system. Also its registration sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(u64);

impl SystemId {
    /// Registration sequence number.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

/// A registered system.
pub(crate) struct SystemEntry {
    pub(crate) id: SystemId,
    pub(crate) name: Cow<'static, str>,
    pub(crate) order: i32,
    run: BoxedSystem,
}

impl SystemEntry {
    const fn sort_key(&self) -> (i32, SystemId) {
        (self.order, self.id)
    }

    /// Runs the system behind the fault-isolation wrapper.
    ///
    /// `Err` results pass through unchanged; panics are caught and turned
    /// into [`SystemError::Panicked`].
    pub(crate) fn run_isolated(&mut self, ctx: &mut SystemContext<'_>) -> SystemResult {
        let run = &mut self.run;
        match panic::catch_unwind(AssertUnwindSafe(|| run(ctx))) {
            Ok(result) => result,
            Err(payload) => Err(SystemError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

/// Best-effort text of a caught panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Ordered list of systems.
///
/// While a pass is running the entries are checked out by the world;
/// registrations and removals made from inside a system are buffered and
/// applied when the pass ends, so they take effect from the next frame.
#[derive(Default)]
pub struct SystemScheduler {
    entries: Vec<SystemEntry>,
    next_sequence: u64,
    running: bool,
    in_flight: Vec<(i32, SystemId, Cow<'static, str>)>,
    removed_during_pass: Vec<SystemId>,
}

impl SystemScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a system, keeping the list sorted by `(order, sequence)`.
    pub fn register<F>(&mut self, name: impl Into<Cow<'static, str>>, order: i32, system: F) -> SystemId
    where
        F: FnMut(&mut SystemContext<'_>) -> SystemResult + 'static,
    {
        let id = SystemId(self.next_sequence);
        self.next_sequence += 1;
        self.entries.push(SystemEntry {
            id,
            name: name.into(),
            order,
            run: Box::new(system),
        });
        if !self.running {
            self.entries.sort_by_key(SystemEntry::sort_key);
        }
        id
    }

    /// Removes a system.
    ///
    /// # Returns
    ///
    /// `true` if the system was registered. Removing a system from inside
    /// a pass also prevents it from running later in that same pass.
    pub fn unregister(&mut self, id: SystemId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() != before {
            return true;
        }
        if self.in_flight.iter().any(|(_, i, _)| *i == id) && !self.removed_during_pass.contains(&id) {
            self.removed_during_pass.push(id);
            return true;
        }
        false
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scheduled().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// System names in execution order.
    ///
    /// Inside a pass this is the order the next frame will use: systems
    /// checked out by the pass, minus those removed, plus those just added.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scheduled().into_iter().map(|(_, _, name)| name).collect()
    }

    fn scheduled(&self) -> Vec<(i32, SystemId, &str)> {
        let mut all: Vec<(i32, SystemId, &str)> = self
            .in_flight
            .iter()
            .filter(|(_, id, _)| !self.removed_during_pass.contains(id))
            .map(|(order, id, name)| (*order, *id, name.as_ref()))
            .chain(self.entries.iter().map(|e| (e.order, e.id, e.name.as_ref())))
            .collect();
        if self.running {
            all.sort_by_key(|&(order, id, _)| (order, id));
        }
        all
    }

    /// Checks out the entries for a pass.
    pub(crate) fn begin_pass(&mut self) -> Vec<SystemEntry> {
        self.running = true;
        self.in_flight = self.entries.iter().map(|e| (e.order, e.id, e.name.clone())).collect();
        std::mem::take(&mut self.entries)
    }

    /// True while a pass has the entries checked out.
    pub(crate) const fn is_running(&self) -> bool {
        self.running
    }

    /// True if the system was unregistered while the current pass runs.
    pub(crate) fn is_cancelled(&self, id: SystemId) -> bool {
        self.removed_during_pass.contains(&id)
    }

    /// Returns the entries after a pass and applies buffered changes.
    pub(crate) fn end_pass(&mut self, mut entries: Vec<SystemEntry>) {
        let added = std::mem::take(&mut self.entries);
        let removed = std::mem::take(&mut self.removed_during_pass);
        entries.retain(|e| !removed.contains(&e.id));
        entries.extend(added);
        entries.sort_by_key(SystemEntry::sort_key);
        self.entries = entries;
        self.in_flight.clear();
        self.running = false;
    }
}

impl fmt::Debug for SystemScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemScheduler")
            .field("systems", &self.names())
            .field("running", &self.running)
            .finish()
    }
}

/// One system fault recorded during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemFailure {
    /// The failing system.
    pub system: SystemId,
    /// Its registered name.
    pub name: String,
    /// What went wrong.
    pub error: SystemError,
}

/// Summary of one [`World::advance`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Frame number of the pass.
    pub frame: u64,
    /// Clamped delta handed to systems, in seconds.
    pub dt: f32,
    /// Systems invoked (failed ones included).
    pub systems_run: usize,
    /// Faults isolated during the pass.
    pub failures: Vec<SystemFailure>,
}

impl FrameReport {
    /// True if every system completed without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
