//! # UI Error Types
//!
//! Boundary faults raised while mutating an output surface. These are
//! configuration errors: they abort the operation that hit them and are
//! reported to the caller.

use thiserror::Error;

use crate::surface::NodeId;

/// Errors raised by surfaces and the reconciler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    /// The reconciler's mount point is not (or no longer) on the surface.
    #[error("output root {0} is missing or detached")]
    MissingRoot(NodeId),

    /// A node id that the surface does not know.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// `child` is not a direct child of `parent`.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Offending node.
        child: NodeId,
    },

    /// The live tree has no node where the previous render put one.
    #[error("node {parent} has no child at position {index}")]
    MissingChild {
        /// Parent node.
        parent: NodeId,
        /// Position that was expected to be occupied.
        index: usize,
    },

    /// Attaching `child` under `parent` would make a node its own ancestor.
    #[error("node {child} cannot be attached under {parent}: it is {parent} or one of its ancestors")]
    HierarchyCycle {
        /// Requested parent.
        parent: NodeId,
        /// Node being attached.
        child: NodeId,
    },

    /// An element-only operation was applied to a text node.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
}

/// Result type for UI operations.
pub type UiResult<T> = Result<T, UiError>;
