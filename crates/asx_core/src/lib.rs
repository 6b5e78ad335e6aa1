//! # ASX Core
//!
//! Data-oriented simulation kernel for the ASX interactive runtime:
//! - Entities are plain monotonically increasing ids
//! - Components live in one sparse store per kind
//! - Systems run in a deterministic `(order, registration)` sequence
//! - Time is a clamped delta computed from host timestamps
//!
//! ## Frame Flow
//!
//! ```text
//! host ── advance(now_ms) ──> FrameClock ── dt ──> SystemScheduler
//!                                                    │
//!                               ┌────────────────────┘
//!                               ▼
//!                 system(ctx) ─ query ─> ComponentStore::get_mut
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use asx_core::{World, Transform, Velocity};
//!
//! let mut world = World::with_builtin_systems();
//! let ship = world.create_entity();
//! world.insert(ship, Transform::new(0.0, 0.0));
//! world.insert(ship, Velocity::new(10.0, 0.0));
//!
//! world.advance(16.0);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod ecs;
pub mod error;

pub use clock::{FrameClock, DEFAULT_MAX_DT};
pub use ecs::{
    builtin, panic_message, BoxedSystem, Component, ComponentHandle, ComponentKind, ComponentSet, ComponentStore, EntityId,
    EntityRegistry, FrameReport, Lifetime, Query, QueryIter, Renderable, SystemContext,
    SystemFailure, SystemId, SystemScheduler, Transform, Velocity, World,
};
pub use error::{SystemError, SystemResult};
