//! # Runtime Configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all) yields a working runtime.
//!
//! ```toml
//! [clock]
//! max_dt = 0.05
//! min_dt = 0.0
//!
//! [frame]
//! budget_ms = 16.667
//! warn_slow_frames = true
//!
//! [storage]
//! prefix = "asx:"
//! path = "asx-storage.json"
//!
//! [boot]
//! os_path = "os.json"
//! boot_route = "/"
//!
//! [log]
//! filter = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use asx_core::{FrameClock, DEFAULT_MAX_DT};
use serde::{Deserialize, Serialize};

use crate::error::{AsxError, AsxResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsxConfig {
    /// Frame clock limits.
    pub clock: ClockConfig,
    /// Frame budget and timing logs.
    pub frame: FrameConfig,
    /// Key-value storage.
    pub storage: StorageConfig,
    /// Boot document and page.
    pub boot: BootConfig,
    /// Log filter.
    pub log: LogConfig,
}

/// `[clock]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Largest step handed to systems, in seconds.
    pub max_dt: f32,
    /// Smallest step handed to systems, in seconds.
    pub min_dt: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            max_dt: DEFAULT_MAX_DT,
            min_dt: 0.0,
        }
    }
}

impl ClockConfig {
    /// Builds a frame clock with these limits.
    #[must_use]
    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new().with_limits(self.min_dt, self.max_dt)
    }
}

/// `[frame]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame budget in milliseconds.
    pub budget_ms: f64,
    /// Log frames that exceed the budget.
    pub warn_slow_frames: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            budget_ms: 16.667,
            warn_slow_frames: true,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Namespace prepended to every key.
    pub prefix: String,
    /// JSON file backing the store. In-memory when absent.
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: "asx:".to_string(),
            path: None,
        }
    }
}

/// `[boot]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Path of the OS document.
    pub os_path: PathBuf,
    /// Route mounted at startup, resolved through the route table.
    pub boot_route: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            os_path: PathBuf::from("os.json"),
            boot_route: "/".to_string(),
        }
    }
}

/// `[log]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AsxConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`AsxError::Toml`] on malformed input, [`AsxError::Config`] when a
    /// value is out of range.
    pub fn from_toml_str(source: &str) -> AsxResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`AsxError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> AsxResult<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`AsxError::Config`] naming the offending key.
    pub fn validate(&self) -> AsxResult<()> {
        let ClockConfig { max_dt, min_dt } = self.clock;
        if !max_dt.is_finite() || max_dt <= 0.0 {
            return Err(AsxError::Config(format!("clock.max_dt must be positive, got {max_dt}")));
        }
        if !min_dt.is_finite() || min_dt < 0.0 || min_dt > max_dt {
            return Err(AsxError::Config(format!(
                "clock.min_dt must be within 0..={max_dt}, got {min_dt}"
            )));
        }
        if !self.frame.budget_ms.is_finite() || self.frame.budget_ms <= 0.0 {
            return Err(AsxError::Config(format!(
                "frame.budget_ms must be positive, got {}",
                self.frame.budget_ms
            )));
        }
        Ok(())
    }
}
