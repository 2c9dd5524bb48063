//! Consumer worker: pulls deliveries, samples one-way latency for traffic
//! belonging to this run, and feeds the shared stats window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::payload;
use crate::stats::StatsWindow;
use crate::transport::Channel;
use crate::utils::error::BenchError;

/// Receive-side worker. Constructed by the harness with a channel that is
/// already consuming from its private bound queue.
pub struct Consumer {
    pub channel: Channel,
    pub run_id: String,
    pub tx_size: u64,
    pub auto_ack: bool,
    pub stats: Arc<StatsWindow>,
    pub time_limit: Duration,
}

impl Consumer {
    /// Receives until the time bound fires, or forever when unbounded.
    ///
    /// Hitting the receive deadline is a normal stop, not an error. A torn
    /// down channel or connection is fatal and propagates.
    pub async fn run(mut self) -> Result<(), BenchError> {
        let start = Instant::now();
        let mut now = start;
        let mut total_received: u64 = 0;
        let deadline = (!self.time_limit.is_zero()).then(|| start + self.time_limit);

        loop {
            let delivery = match deadline {
                None => self.channel.next_delivery().await?,
                Some(deadline) => {
                    if now >= deadline {
                        break;
                    }
                    match timeout(deadline - now, self.channel.next_delivery()).await {
                        Ok(delivery) => delivery?,
                        Err(_) => break,
                    }
                }
            };
            total_received += 1;

            // Only deliveries routed with this run's id yield a latency
            // sample; anything else is co-located traffic and records zero,
            // which the stats window treats as "no sample".
            let latency = if delivery.routing_key == self.run_id {
                payload::decode_timestamp(&delivery.payload)
                    .map(|sent| payload::now_nanos().saturating_sub(sent))
                    .unwrap_or(0)
            } else {
                0
            };

            if !self.auto_ack {
                self.channel.ack(delivery.delivery_tag)?;
            }
            if self.tx_size != 0 && total_received % self.tx_size == 0 {
                self.channel.tx_commit()?;
            }

            now = Instant::now();
            self.stats.record(now, latency);
        }

        let elapsed_ms = now.saturating_duration_since(start).as_millis() as u64;
        if elapsed_ms > 0 {
            println!("recving rate avg: {} msg/s", total_received * 1000 / elapsed_ms);
        }
        Ok(())
    }
}
