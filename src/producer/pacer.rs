use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ReturnCounter;

/// How long a producer must pause so that `sent` messages over `elapsed`
/// time converge on `rate_limit` messages per second.
///
/// A rate limit of zero disables pacing entirely. The result is never
/// negative: when the producer is behind schedule the pause is zero.
pub fn compute_delay(rate_limit: u64, sent: u64, elapsed: Duration) -> Duration {
    if rate_limit == 0 {
        return Duration::ZERO;
    }
    // example: rate_limit is 5000 msg/s, 10 ms have elapsed and 200 messages
    // were sent. 200 messages should have taken 200 * 1000 / 5000 = 40 ms,
    // so pause for 40 ms - 10 ms.
    let expected = Duration::from_millis(sent * 1000 / rate_limit);
    expected.saturating_sub(elapsed)
}

/// Per-producer pacing and local reporting state.
///
/// Checked in once per message, before publishing. One call both computes the
/// rate-limiting pause and, when the sampling interval has elapsed, prints
/// the window throughput plus the delivery-return rate and starts a fresh
/// window.
pub struct Pacer {
    rate_limit: u64,
    interval: Duration,
    window_start: Instant,
    sent_in_window: u64,
    returns: Arc<ReturnCounter>,
}

impl Pacer {
    pub fn new(rate_limit: u64, interval: Duration, returns: Arc<ReturnCounter>) -> Self {
        Self {
            rate_limit,
            interval,
            window_start: Instant::now(),
            sent_in_window: 0,
            returns,
        }
    }

    /// Re-anchors the window, for when construction happened noticeably
    /// before the send loop started.
    pub fn reset_window(&mut self, now: Instant) {
        self.window_start = now;
        self.sent_in_window = 0;
    }

    /// Bumps the in-window send count after a publish.
    pub fn record_send(&mut self) {
        self.sent_in_window += 1;
    }

    /// Returns the pause needed to hold the target rate, reporting and
    /// resetting the window as a side effect when it has run its interval.
    pub fn check_in(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.window_start);
        let pause = compute_delay(self.rate_limit, self.sent_in_window, elapsed);

        if elapsed > self.interval {
            let elapsed_ms = elapsed.as_millis().max(1) as u64;
            println!(
                "sending rate: {} msg/s, basic returns: {} ret/s",
                self.sent_in_window * 1000 / elapsed_ms,
                self.returns.take() * 1000 / elapsed_ms
            );
            self.sent_in_window = 0;
            self.window_start = now;
        }

        pause
    }
}
