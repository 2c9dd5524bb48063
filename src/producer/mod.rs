//! Producer worker: synthesizes timestamped payloads and publishes them
//! until a message-count or wall-clock bound fires, pacing itself to an
//! optional target rate.

mod pacer;

pub use pacer::{Pacer, compute_delay};

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::time::sleep;

use crate::payload;
use crate::transport::{Channel, PublishFlags};
use crate::utils::error::BenchError;

/// Counts broker return notifications (mandatory/immediate publishes that
/// could not be delivered). Written by the return-listener task the harness
/// wires up, drained by the pacer's window report.
#[derive(Debug, Default)]
pub struct ReturnCounter(Mutex<u64>);

impl ReturnCounter {
    pub fn log_return(&self) {
        *self.0.lock().unwrap() += 1;
    }

    /// Returns the count accumulated since the last call and resets it.
    pub fn take(&self) -> u64 {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

/// Send-side worker. Constructed by the harness with a channel that already
/// has the exchange declared and (if transactional) tx mode selected.
pub struct Producer {
    pub channel: Channel,
    pub exchange: String,
    pub run_id: String,
    pub flags: PublishFlags,
    pub tx_size: u64,
    pub min_msg_size: usize,
    pub message_limit: u64,
    pub time_limit: Duration,
    pub pacer: Pacer,
}

impl Producer {
    /// Sends until the time or message bound fires, then prints the overall
    /// average rate.
    ///
    /// The message bound is inclusive: the check runs before each send, so a
    /// limit of N permits N + 1 sends. Downstream tooling depends on that
    /// count, so it is kept as-is.
    pub async fn run(mut self) -> Result<(), BenchError> {
        let start = Instant::now();
        let mut now = start;
        let mut total_sent: u64 = 0;
        self.pacer.reset_window(start);

        while (self.time_limit.is_zero() || now < start + self.time_limit)
            && (self.message_limit == 0 || total_sent <= self.message_limit)
        {
            let pause = self.pacer.check_in(now);
            if pause > Duration::ZERO {
                sleep(pause).await;
            }

            let body = payload::encode(total_sent as u32, payload::now_nanos(), self.min_msg_size);
            self.channel
                .publish(&self.exchange, &self.run_id, body, self.flags)?;
            total_sent += 1;
            self.pacer.record_send();

            if self.tx_size != 0 && total_sent % self.tx_size == 0 {
                self.channel.tx_commit()?;
            }
            now = Instant::now();
        }

        let elapsed_ms = now.saturating_duration_since(start).as_millis().max(1) as u64;
        println!("sending rate avg: {} msg/s", total_sent * 1000 / elapsed_ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
