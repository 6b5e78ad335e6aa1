//! # Frame Statistics and Driver
//!
//! ```text
//! Frame N:
//! ┌───────────────────────────────────────────────────────────────┐
//! │ 1. LOGIC   World::advance (clock tick + systems in order)     │
//! │ 2. TICK    tick handlers, registration order                  │
//! │ 3. INPUT   drain the input queue, dispatch by name            │
//! │ 4. ROUTE   apply the last navigation request, if any          │
//! │ 5. RENDER  backend reads &World, produces a FrameOutput       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`FrameDriver`] pumps [`AsxRuntime::frame`] either on simulated
//! timestamps (tests, headless runs) or paced against the wall clock.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::runtime::AsxRuntime;

/// Timing and counters for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Clamped delta handed to systems, in seconds.
    pub dt: f32,
    /// Whole frame, in microseconds.
    pub total_us: u64,
    /// World pass, in microseconds.
    pub logic_us: u64,
    /// Tick handlers, in microseconds.
    pub tick_us: u64,
    /// Input dispatch and navigation, in microseconds.
    pub input_us: u64,
    /// Render backend, in microseconds.
    pub render_us: u64,
    /// Systems invoked.
    pub systems_run: usize,
    /// Systems that failed or panicked.
    pub system_failures: usize,
    /// Tick handlers that failed or panicked.
    pub handler_failures: usize,
    /// Queued inputs dispatched.
    pub inputs_dispatched: usize,
    /// Instances produced by the renderer.
    pub instances: usize,
}

/// Microseconds elapsed since `start`.
#[inline]
pub(crate) fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Aggregates [`FrameStats`] over a run.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    budget_us: u64,
    frames_recorded: u64,
    total_us_sum: u64,
    logic_us_sum: u64,
    tick_us_sum: u64,
    input_us_sum: u64,
    render_us_sum: u64,
    min_frame_us: u64,
    max_frame_us: u64,
    frames_over_budget: u64,
    system_failures: u64,
    handler_failures: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator for a frame budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_us: (budget_ms * 1000.0).max(0.0) as u64,
            frames_recorded: 0,
            total_us_sum: 0,
            logic_us_sum: 0,
            tick_us_sum: 0,
            input_us_sum: 0,
            render_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            system_failures: 0,
            handler_failures: 0,
        }
    }

    /// Records one frame. Returns true if it exceeded the budget.
    pub fn record(&mut self, stats: &FrameStats) -> bool {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.logic_us_sum += stats.logic_us;
        self.tick_us_sum += stats.tick_us;
        self.input_us_sum += stats.input_us;
        self.render_us_sum += stats.render_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.system_failures += stats.system_failures as u64;
        self.handler_failures += stats.handler_failures as u64;

        let over = stats.total_us > self.budget_us;
        if over {
            self.frames_over_budget += 1;
        }
        over
    }

    /// Frames recorded so far.
    #[inline]
    #[must_use]
    pub const fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// Frames that exceeded the budget.
    #[inline]
    #[must_use]
    pub const fn frames_over_budget(&self) -> u64 {
        self.frames_over_budget
    }

    /// Average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        self.avg_ms(self.total_us_sum)
    }

    /// Average frames per second.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Fraction of frames over budget, in `0.0..=1.0`.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    fn avg_ms(&self, sum_us: u64) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (sum_us as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Multi-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };
        let mut out = String::new();
        let _ = writeln!(out, "┌─ FRAMES ──────────────────────────────────────────");
        let _ = writeln!(out, "│ Recorded:       {}", self.frames_recorded);
        let _ = writeln!(out, "│ Average:        {:.3} ms ({:.1} FPS)", self.avg_frame_ms(), self.avg_fps());
        let _ = writeln!(out, "│ Min / Max:      {:.3} / {:.3} ms", min_ms, self.max_frame_us as f64 / 1000.0);
        let _ = writeln!(
            out,
            "│ Over budget:    {} ({:.1}%) of {:.3} ms",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0,
            self.budget_us as f64 / 1000.0
        );
        let _ = writeln!(out, "├─ BREAKDOWN ───────────────────────────────────────");
        let _ = writeln!(out, "│ Logic:          {:.3} ms", self.avg_ms(self.logic_us_sum));
        let _ = writeln!(out, "│ Tick:           {:.3} ms", self.avg_ms(self.tick_us_sum));
        let _ = writeln!(out, "│ Input:          {:.3} ms", self.avg_ms(self.input_us_sum));
        let _ = writeln!(out, "│ Render:         {:.3} ms", self.avg_ms(self.render_us_sum));
        let _ = writeln!(out, "├─ FAULTS ──────────────────────────────────────────");
        let _ = writeln!(out, "│ Systems:        {}", self.system_failures);
        let _ = writeln!(out, "│ Handlers:       {}", self.handler_failures);
        let _ = write!(out, "└───────────────────────────────────────────────────");
        out
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new(16.667)
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Pumps frames until a frame limit is reached or a stop is requested.
#[derive(Debug, Clone, Default)]
pub struct FrameDriver {
    stop: Arc<AtomicBool>,
}

impl FrameDriver {
    /// Creates a driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that stops the driver from any thread.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Requests a stop after the current frame.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Runs up to `frames` frames on simulated timestamps
    /// `start_ms + step_ms`, `start_ms + 2 * step_ms`, ...
    ///
    /// # Returns
    ///
    /// Frames actually run.
    pub fn run(&self, runtime: &mut AsxRuntime, frames: u64, start_ms: f64, step_ms: f64) -> u64 {
        let mut ran = 0;
        while ran < frames && !self.is_stopped() {
            ran += 1;
            runtime.frame(start_ms + step_ms * ran as f64);
        }
        debug!(frames = ran, "simulated run finished");
        ran
    }

    /// Runs up to `frames` frames against the wall clock, sleeping out the
    /// remainder of each `frame_time`.
    ///
    /// # Returns
    ///
    /// Frames actually run.
    pub fn run_paced(&self, runtime: &mut AsxRuntime, frames: u64, frame_time: Duration) -> u64 {
        let origin = Instant::now();
        let mut ran = 0;
        while ran < frames && !self.is_stopped() {
            let frame_start = Instant::now();
            runtime.frame(origin.elapsed().as_secs_f64() * 1000.0);
            ran += 1;
            if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
                thread::sleep(rest);
            }
        }
        info!(frames = ran, elapsed_ms = origin.elapsed().as_millis() as u64, "paced run finished");
        ran
    }
}
