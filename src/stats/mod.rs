//! Shared receive-side statistics.
//!
//! A single [`StatsWindow`] is shared by every consumer in a run. All updates
//! go through one mutex so that counter updates and the report-then-reset
//! sequence stay atomic with respect to each other, even with many consumers
//! recording concurrently.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling-window accumulator of message count and latency samples.
///
/// Latency values are nanoseconds; a value of zero means "no latency sample"
/// (the delivery did not correlate to this run) and only bumps the message
/// count. When the configured interval elapses, the window prints a summary
/// line and resets.
pub struct StatsWindow {
    interval: Duration,
    inner: Mutex<WindowState>,
}

/// Point-in-time copy of the current window counters.
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub msg_count: u64,
    pub latency_count: u64,
    pub min_latency: u64,
    pub max_latency: u64,
    pub cumulative_latency: u64,
}

struct WindowState {
    window_start: Instant,
    msg_count: u64,
    latency_count: u64,
    min_latency: u64,
    max_latency: u64,
    cumulative_latency: u64,
}

impl WindowState {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            msg_count: 0,
            latency_count: 0,
            min_latency: u64::MAX,
            max_latency: 0,
            cumulative_latency: 0,
        }
    }

    fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Renders one report line. The latency clause is omitted entirely when
    /// the window saw no correlated samples; latency figures are printed in
    /// microseconds.
    fn report_line(&self, elapsed: Duration) -> String {
        let elapsed_ms = elapsed.as_millis().max(1) as u64;
        let mut line = format!("recving rate: {} msg/s", self.msg_count * 1000 / elapsed_ms);
        if self.latency_count > 0 {
            line.push_str(&format!(
                ", min/avg/max latency: {}/{}/{} microseconds",
                self.min_latency / 1000,
                self.cumulative_latency / (1000 * self.latency_count),
                self.max_latency / 1000
            ));
        }
        line
    }
}

impl StatsWindow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            inner: Mutex::new(WindowState::new(Instant::now())),
        }
    }

    /// Records one delivery. `latency_nanos == 0` counts the message but
    /// leaves the latency aggregates untouched.
    ///
    /// When the sampling interval has elapsed, prints the window summary and
    /// starts a fresh window; the report and the reset happen under the same
    /// lock acquisition as the counter update.
    pub fn record(&self, now: Instant, latency_nanos: u64) {
        let mut state = self.inner.lock().unwrap();
        state.msg_count += 1;

        if latency_nanos > 0 {
            state.min_latency = state.min_latency.min(latency_nanos);
            state.max_latency = state.max_latency.max(latency_nanos);
            state.cumulative_latency += latency_nanos;
            state.latency_count += 1;
        }

        let elapsed = now.saturating_duration_since(state.window_start);
        if elapsed > self.interval {
            println!("{}", state.report_line(elapsed));
            state.reset(now);
        }
    }

    /// Current window counters, without resetting them.
    pub fn snapshot(&self) -> StatsSnapshot {
        let state = self.inner.lock().unwrap();
        StatsSnapshot {
            msg_count: state.msg_count,
            latency_count: state.latency_count,
            min_latency: state.min_latency,
            max_latency: state.max_latency,
            cumulative_latency: state.cumulative_latency,
        }
    }
}

#[cfg(test)]
mod tests;
