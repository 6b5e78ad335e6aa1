//! # ASX UI
//!
//! Declarative interface layer for the ASX runtime:
//! - Views are plain [`VNode`] trees rebuilt every frame
//! - A [`Surface`] is the live output tree (the in-memory [`DomSurface`]
//!   ships with the crate)
//! - The [`TreeReconciler`] turns a new tree into the minimal positional
//!   mutation set
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UI PIPELINE                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  HudContent → render() → VNode → patch() → Surface        │
//! │                                     ↓                     │
//! │                             diff old vs new by position   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Interactive elements bind handlers by name (`onclick` + `data-arg`),
//! so trees stay serializable and comparable.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod hud;
pub mod reconciler;
pub mod style;
pub mod surface;
pub mod vdom;

pub use error::{UiError, UiResult};
pub use hud::{error_view, render, render_with, Hud, HudContent};
pub use reconciler::TreeReconciler;
pub use style::{Color, Theme};
pub use surface::{Binding, DomSurface, MutationStats, NodeId, Surface};
pub use vdom::{el, text, Primitive, PropValue, VElement, VNode};
