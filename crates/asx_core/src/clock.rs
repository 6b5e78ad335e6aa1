//! # Frame Clock
//!
//! Turns successive host timestamps (monotonic milliseconds) into a clamped
//! per-frame delta in seconds.
//!
//! Long stalls (tab switch, debugger pause) are capped at `max_dt` so that
//! integration does not jump. Non-monotonic timestamps are floored at
//! `min_dt`, which defaults to zero.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default upper bound on a frame delta, in seconds.
pub const DEFAULT_MAX_DT: f32 = 0.05;

/// Clamped delta-time source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    last_timestamp_ms: f64,
    max_dt: f32,
    min_dt: f32,
}

impl FrameClock {
    /// Creates a clock whose previous timestamp is `0.0`.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Creates a clock that treats `now_ms` as the previous frame time.
    #[must_use]
    pub const fn starting_at(now_ms: f64) -> Self {
        Self {
            last_timestamp_ms: now_ms,
            max_dt: DEFAULT_MAX_DT,
            min_dt: 0.0,
        }
    }

    /// Overrides the clamp range.
    ///
    /// # Arguments
    ///
    /// * `min_dt` - Floor in seconds (negative values are raised to 0)
    /// * `max_dt` - Cap in seconds (never below `min_dt`)
    #[must_use]
    pub fn with_limits(mut self, min_dt: f32, max_dt: f32) -> Self {
        self.min_dt = min_dt.max(0.0);
        self.max_dt = max_dt.max(self.min_dt);
        self
    }

    /// Computes the delta since the previous call and records `now_ms`.
    ///
    /// # Returns
    ///
    /// `clamp((now_ms - last) / 1000, min_dt, max_dt)` in seconds.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let raw = ((now_ms - self.last_timestamp_ms) / 1000.0) as f32;
        self.last_timestamp_ms = now_ms;

        if raw < self.min_dt {
            debug!(raw_dt = raw, now_ms, "clock went backwards or stalled, flooring dt");
            return self.min_dt;
        }
        raw.min(self.max_dt)
    }

    /// Timestamp of the previous tick, in milliseconds.
    #[inline]
    #[must_use]
    pub const fn last_timestamp(&self) -> f64 {
        self.last_timestamp_ms
    }

    /// Upper clamp in seconds.
    #[inline]
    #[must_use]
    pub const fn max_dt(&self) -> f32 {
        self.max_dt
    }

    /// Lower clamp in seconds.
    #[inline]
    #[must_use]
    pub const fn min_dt(&self) -> f32 {
        self.min_dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
