//! # Entity Component System
//!
//! A small, correctness-first ECS.
//!
//! ## Design Philosophy
//!
//! - Entity ids start at 1 and are never reused within a world
//! - One sparse store per component kind, created on first reference
//! - Queries are recomputed on every call and never cached
//! - Systems run strictly sequentially, one fault never stops a frame

pub mod builtin;
mod component;
mod entity;
mod query;
mod storage;
mod system;
mod world;

pub use component::{Component, ComponentKind, Lifetime, Renderable, Transform, Velocity};
pub use entity::{EntityId, EntityRegistry};
pub use query::{ComponentSet, Query, QueryIter};
pub use storage::{ComponentHandle, ComponentStore};
pub use system::{
    panic_message, BoxedSystem, FrameReport, SystemContext, SystemFailure, SystemId, SystemScheduler,
};
pub use world::World;
