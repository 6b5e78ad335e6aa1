//! # ASX
//!
//! Runtime shell joining the simulation kernel ([`asx_core`]) and the
//! interface layer ([`asx_ui`]):
//! - An [`OsDocument`] maps routes to pages; each page may carry a HUD, a
//!   scene, entities and a named behaviour
//! - The [`PageController`] mounts pages and releases everything a page
//!   registered when it unmounts
//! - Tick, input and event handlers run isolated: a fault is logged and
//!   the frame goes on
//! - A namespaced [`KeyValueStore`] gives best-effort persistence
//!
//! ## Frame
//!
//! ```text
//! World::advance ─> tick handlers ─> queued input ─> navigation ─> render(&World)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use asx::{AsxConfig, AsxRuntime, BehaviourRegistry, OsDocument};
//!
//! let os = OsDocument::load("os.json")?;
//! let mut runtime = AsxRuntime::new(AsxConfig::default(), os, BehaviourRegistry::new())?;
//! runtime.boot()?;
//! runtime.frame(16.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod frame;
pub mod handler;
pub mod hud;
pub mod input;
pub mod os;
pub mod page;
pub mod renderer;
pub mod runtime;
pub mod storage;
pub mod tick;

pub use config::{AsxConfig, BootConfig, ClockConfig, FrameConfig, LogConfig, StorageConfig};
pub use error::{AsxError, AsxResult};
pub use events::EventEmitter;
pub use frame::{FrameDriver, FrameStats, FrameStatsAccumulator};
pub use handler::{run_isolated, HandlerContext, HandlerId};
pub use hud::HudLayer;
pub use input::{InputDispatcher, InputEvent, InputQueue, InputSender};
pub use os::{route_from_fragment, EntitySpec, OsDocument, OsMeta, PageDef, PageScript};
pub use page::{Behaviour, BehaviourRegistry, PageContext, PageController, PageHost};
pub use renderer::{FrameOutput, InstanceData, RenderBackend, SceneDesc, SceneKind, SceneRenderer};
pub use runtime::{AsxRuntime, NAVIGATE_INPUT};
pub use storage::{JsonFileBackend, KeyValueStore, MemoryBackend, StorageBackend};
pub use tick::{TickHandlers, TickInfo};
