//! # Core Error Types
//!
//! Faults raised inside a single system. These are transient by contract:
//! the scheduler logs them and keeps running the rest of the frame.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors a system can report for one frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    /// Free-form failure reported by the system itself.
    #[error("{0}")]
    Failed(String),

    /// A system expected a component the entity does not carry.
    #[error("entity {entity} has no `{kind}` component")]
    MissingComponent {
        /// Entity that was inspected.
        entity: EntityId,
        /// Name of the missing component kind.
        kind: &'static str,
    },

    /// The system panicked; the payload message was captured.
    #[error("system panicked: {0}")]
    Panicked(String),
}

impl SystemError {
    /// Convenience constructor for [`SystemError::Failed`].
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type returned by every system.
pub type SystemResult = Result<(), SystemError>;
