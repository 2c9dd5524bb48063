//! Command-line surface. Every knob is optional and has a default, so a bare
//! `mcast-bench` runs one producer and one consumer flat out against a local
//! broker.

use std::time::Duration;

use clap::Parser;

use crate::harness::BenchConfig;

#[derive(Debug, Parser)]
#[command(
    name = "mcast-bench",
    about = "Multicast throughput and latency benchmark for a pub/sub broker",
    version
)]
pub struct Args {
    /// Broker host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Broker port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Exchange type (direct or fanout)
    #[arg(long = "type", default_value = "direct")]
    pub exchange_type: String,

    /// Exchange name (defaults to the exchange type)
    #[arg(long)]
    pub exchange: Option<String>,

    /// Stats sampling interval in seconds
    #[arg(long, default_value_t = 1)]
    pub interval: u64,

    /// Per-producer send rate ceiling in msg/s (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub rate: u64,

    /// Number of producers
    #[arg(long, default_value_t = 1)]
    pub producers: usize,

    /// Per-producer message count bound (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub messages: u64,

    /// Number of consumers
    #[arg(long, default_value_t = 1)]
    pub consumers: usize,

    /// Share one connection across all consumers
    #[arg(long)]
    pub connections: bool,

    /// Producer transaction commit batch size (0 = no transactions)
    #[arg(long, default_value_t = 0)]
    pub ptxsize: u64,

    /// Consumer transaction commit batch size (0 = no transactions)
    #[arg(long, default_value_t = 0)]
    pub ctxsize: u64,

    /// Consumer auto-acknowledge
    #[arg(long)]
    pub autoack: bool,

    /// Consumer prefetch limit (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub qos: u32,

    /// Minimum message size in bytes
    #[arg(long, default_value_t = 0)]
    pub size: usize,

    /// Run time limit in seconds (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub time: u64,

    /// Message flag: persistent, mandatory or immediate (repeatable)
    #[arg(long = "flag")]
    pub flags: Vec<String>,

    /// Maximum transport frame size in bytes (0 = protocol default)
    #[arg(long, default_value_t = 0)]
    pub framemax: usize,

    /// Heartbeat ping interval in seconds (0 = disabled)
    #[arg(long, default_value_t = 0)]
    pub heartbeat: u64,
}

impl Args {
    pub fn into_config(self) -> BenchConfig {
        let exchange_name = self
            .exchange
            .unwrap_or_else(|| self.exchange_type.clone());
        BenchConfig {
            host: self.host,
            port: self.port,
            exchange_type: self.exchange_type,
            exchange_name,
            sampling_interval: Duration::from_secs(self.interval),
            rate_limit: self.rate,
            producer_count: self.producers,
            consumer_count: self.consumers,
            message_limit: self.messages,
            share_connections: self.connections,
            producer_tx_size: self.ptxsize,
            consumer_tx_size: self.ctxsize,
            auto_ack: self.autoack,
            prefetch_count: self.qos,
            min_msg_size: self.size,
            time_limit: Duration::from_secs(self.time),
            flags: self.flags,
            frame_max: self.framemax,
            heartbeat: self.heartbeat,
        }
    }
}

#[cfg(test)]
mod tests;
