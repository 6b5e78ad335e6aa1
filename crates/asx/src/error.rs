//! # Runtime Errors
//!
//! Boundary faults (missing pages, bad documents, a lost HUD root) are
//! returned to the caller. Handler faults are isolated by the runtime and
//! only ever logged.

use std::io;

use asx_ui::UiError;
use thiserror::Error;

/// Errors raised by the runtime shell.
#[derive(Error, Debug)]
pub enum AsxError {
    /// The OS document has no page under this key.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// A page names a behaviour nobody registered.
    #[error("Behaviour not found: {0}")]
    BehaviourNotFound(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A tick, input or event handler reported a failure.
    #[error("handler failed: {0}")]
    Handler(String),

    /// A handler panicked; the payload message was captured.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON document or value.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML configuration.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Interface failure, including a missing HUD root.
    #[error("UI error: {0}")]
    Ui(#[from] UiError),
}

impl AsxError {
    /// Convenience constructor for [`AsxError::Handler`].
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// Result type for runtime operations.
pub type AsxResult<T> = Result<T, AsxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(AsxError::PageNotFound("store".into()).to_string(), "Page not found: store");
        assert_eq!(AsxError::handler("bad arg").to_string(), "handler failed: bad arg");
    }

    #[test]
    fn test_ui_conversion() {
        let root = asx_ui::DomSurface::default().root();
        let err: AsxError = UiError::MissingRoot(root).into();
        assert!(matches!(err, AsxError::Ui(UiError::MissingRoot(_))));
    }
}
