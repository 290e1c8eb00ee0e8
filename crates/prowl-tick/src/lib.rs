//! Fixed-timestep tick loop for Prowl.
//!
//! Drives the two periodic paths of the coordinator: the fast session
//! tick (win-condition and timer checks) and the slow maintenance sweep
//! (stale-room and inactive-player pruning). Both enqueue work onto the
//! coordinator's single-writer boundary rather than mutating state from
//! their own task.
//!
//! # Integration
//!
//! ```ignore
//! let mut ticker = TickLoop::with_rate(20);
//! loop {
//!     let info = ticker.wait_for_tick().await;
//!     let mut coordinator = state.coordinator.lock().await;
//!     coordinator.tick(info.dt);
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`TickLoop`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Interval between ticks. `None` means event-driven: the loop
    /// never fires on its own.
    pub period: Option<Duration>,
    /// Random jitter (0–max µs) added to the *first* tick to
    /// desynchronize loops started at the same instant.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: None,
            initial_jitter_us: 2_000, // 0–2 ms default jitter
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// A config for a rate-driven loop, clamped to
    /// [`Self::MAX_TICK_RATE_HZ`]. Rate 0 means event-driven.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        let rate = if tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick rate exceeds maximum — clamping"
            );
            Self::MAX_TICK_RATE_HZ
        } else {
            tick_rate_hz
        };
        Self {
            period: (rate > 0)
                .then(|| Duration::from_secs_f64(1.0 / rate as f64)),
            ..Default::default()
        }
    }

    /// A config for a period-driven loop (maintenance sweeps).
    pub fn with_period(period: Duration) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info and stats
// ---------------------------------------------------------------------------

/// Information about one fired tick, returned by
/// [`TickLoop::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Fixed delta time for this tick (the configured period).
    pub dt: Duration,
    /// `true` if this tick fired late (>10% of the period).
    pub overrun: bool,
    /// How many ticks were skipped while behind (0 normally).
    pub ticks_skipped: u64,
}

/// Running counters for a tick loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickStats {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Fixed-timestep loop. One per periodic coordinator path.
///
/// Overruns are handled by skipping ahead: when the loop wakes late, the
/// missed ticks are dropped and the next deadline is scheduled from now.
/// This trades cadence precision for protection against death spirals
/// when a tick handler stalls.
pub struct TickLoop {
    period: Option<Duration>,
    tick_count: u64,
    /// When the next tick should fire.
    next_tick: Option<TokioInstant>,
    stats: TickStats,
}

impl TickLoop {
    pub fn new(config: TickConfig) -> Self {
        // First deadline gets jitter so loops created together drift apart.
        let next_tick = config.period.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                let us = rand::rng().random_range(0..config.initial_jitter_us);
                Duration::from_micros(us)
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + d + jitter
        });

        match config.period {
            None => debug!("tick loop created in event-driven mode"),
            Some(period) => debug!(?period, "tick loop created"),
        }

        Self {
            period: config.period,
            tick_count: 0,
            next_tick,
            stats: TickStats::default(),
        }
    }

    /// A loop firing `tick_rate_hz` times per second.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// A loop firing once per `period`.
    pub fn with_period(period: Duration) -> Self {
        Self::new(TickConfig::with_period(period))
    }

    /// Waits until the next tick is due and returns its [`TickInfo`].
    ///
    /// In event-driven mode this future pends forever — it will never
    /// resolve on its own, but `tokio::select!` still processes other
    /// branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, period) = match (self.next_tick, self.period) {
            (Some(next), Some(period)) => (next, period),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0u64;

        if overrun {
            ticks_skipped =
                late_by.as_nanos() as u64 / period.as_nanos() as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "tick overrun — skipping ahead"
                );
            }
            self.stats.total_overruns += 1;
        }

        // Always schedule from now, not from the missed deadline.
        self.next_tick = Some(now + period);
        self.stats.total_skipped += ticks_skipped;
        self.stats.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: period,
            overrun,
            ticks_skipped,
        }
    }

    /// Whether this loop never fires on its own.
    pub fn is_event_driven(&self) -> bool {
        self.period.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rate_zero_is_event_driven() {
        let config = TickConfig::with_rate(0);
        assert!(config.period.is_none());
        assert!(TickLoop::new(config).is_event_driven());
    }

    #[test]
    fn test_with_rate_clamps_to_maximum() {
        let config = TickConfig::with_rate(100_000);
        let expected =
            Duration::from_secs_f64(1.0 / TickConfig::MAX_TICK_RATE_HZ as f64);
        assert_eq!(config.period, Some(expected));
    }

    #[test]
    fn test_with_period_sets_exact_interval() {
        let ticker = TickLoop::with_period(Duration::from_secs(300));
        assert_eq!(ticker.period(), Some(Duration::from_secs(300)));
        assert!(!ticker.is_event_driven());
    }
}
