//! Run orchestration: the connection plan, worker spawn order, and the join
//! sequence that drains the send side before the receive side is torn down.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::consumer::Consumer;
use crate::producer::{Pacer, Producer, ReturnCounter};
use crate::stats::StatsWindow;
use crate::transport::memory::{MemoryBroker, MemoryConnection};
use crate::transport::websocket::WsConnection;
use crate::transport::{Connection, PublishFlags};
use crate::utils::error::BenchError;

/// Resolved benchmark settings. Fields mirror the CLI surface.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub host: String,
    pub port: u16,
    pub exchange_type: String,
    pub exchange_name: String,
    pub sampling_interval: Duration,
    pub rate_limit: u64,
    pub producer_count: usize,
    pub consumer_count: usize,
    pub message_limit: u64,
    pub share_connections: bool,
    pub producer_tx_size: u64,
    pub consumer_tx_size: u64,
    pub auto_ack: bool,
    pub prefetch_count: u32,
    pub min_msg_size: usize,
    pub time_limit: Duration,
    pub flags: Vec<String>,
    pub frame_max: usize,
    pub heartbeat: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            exchange_type: "direct".to_string(),
            exchange_name: "direct".to_string(),
            sampling_interval: Duration::from_secs(1),
            rate_limit: 0,
            producer_count: 1,
            consumer_count: 1,
            message_limit: 0,
            share_connections: false,
            producer_tx_size: 0,
            consumer_tx_size: 0,
            auto_ack: false,
            prefetch_count: 0,
            min_msg_size: 0,
            time_limit: Duration::ZERO,
            flags: Vec::new(),
            frame_max: 0,
            heartbeat: 0,
        }
    }
}

/// Which physical fabric carries the run.
pub enum Fabric {
    /// A real broker over WebSocket.
    Ws,
    /// The in-process loopback fabric.
    Memory(Arc<MemoryBroker>),
}

impl Fabric {
    async fn connect(&self, cfg: &BenchConfig) -> Result<Connection, BenchError> {
        match self {
            Fabric::Ws => Ok(Connection::Ws(
                WsConnection::connect(&cfg.host, cfg.port, cfg.frame_max, cfg.heartbeat).await?,
            )),
            Fabric::Memory(broker) => {
                Ok(Connection::Memory(MemoryConnection::new(broker.clone())))
            }
        }
    }
}

/// Owns the run identity and the shared stats window, and drives one whole
/// benchmark run.
pub struct Harness {
    cfg: BenchConfig,
    fabric: Fabric,
    run_id: String,
    stats: Arc<StatsWindow>,
}

impl Harness {
    pub fn new(cfg: BenchConfig, fabric: Fabric) -> Self {
        let stats = Arc::new(StatsWindow::new(cfg.sampling_interval));
        Self {
            run_id: Uuid::new_v4().to_string(),
            stats,
            cfg,
            fabric,
        }
    }

    /// The run-scoped token used as routing and binding key. It is what lets
    /// consumers tell this run's traffic apart from co-located runs on the
    /// same broker.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stats(&self) -> Arc<StatsWindow> {
        self.stats.clone()
    }

    /// Runs the whole benchmark.
    ///
    /// Consumers are set up first so their bindings exist before the first
    /// publish. Producers are joined first and their connections closed, so
    /// the send side has fully drained while consumers are still receiving;
    /// consumers then stop on their own time bound. The first worker failure
    /// is surfaced after every worker has been waited on.
    pub async fn run(&self) -> Result<(), BenchError> {
        let cfg = &self.cfg;
        let flags = PublishFlags::resolve(&cfg.flags);

        let connection_count = if cfg.share_connections {
            1
        } else {
            cfg.consumer_count
        };
        let mut consumer_connections = Vec::with_capacity(connection_count);
        for _ in 0..connection_count {
            consumer_connections.push(self.fabric.connect(cfg).await?);
        }

        let mut consumer_handles: Vec<JoinHandle<Result<(), BenchError>>> = Vec::new();
        for i in 0..cfg.consumer_count {
            info!("starting consumer #{i}");
            let conn = &consumer_connections[i % connection_count];
            let mut channel = conn.create_channel();
            if cfg.consumer_tx_size > 0 {
                channel.tx_select()?;
            }
            channel.exchange_declare(&cfg.exchange_name, &cfg.exchange_type)?;
            let queue = channel.queue_declare(flags.persistent)?;
            if cfg.prefetch_count > 0 {
                channel.qos(cfg.prefetch_count)?;
            }
            channel.consume(&queue, cfg.auto_ack)?;
            channel.queue_bind(&queue, &cfg.exchange_name, &self.run_id)?;

            let consumer = Consumer {
                channel,
                run_id: self.run_id.clone(),
                tx_size: cfg.consumer_tx_size,
                auto_ack: cfg.auto_ack,
                stats: self.stats.clone(),
                time_limit: cfg.time_limit,
            };
            consumer_handles.push(tokio::spawn(consumer.run()));
        }

        let mut producer_connections = Vec::with_capacity(cfg.producer_count);
        let mut producer_handles: Vec<JoinHandle<Result<(), BenchError>>> = Vec::new();
        for i in 0..cfg.producer_count {
            info!("starting producer #{i}");
            let conn = self.fabric.connect(cfg).await?;
            let mut channel = conn.create_channel();
            if cfg.producer_tx_size > 0 {
                channel.tx_select()?;
            }
            channel.exchange_declare(&cfg.exchange_name, &cfg.exchange_type)?;

            // Return notices arrive asynchronously on the connection's read
            // side; a small task funnels them into the producer's counter.
            let returns = Arc::new(ReturnCounter::default());
            if let Some(mut return_rx) = channel.take_returns() {
                let returns = returns.clone();
                tokio::spawn(async move {
                    while return_rx.recv().await.is_some() {
                        returns.log_return();
                    }
                });
            }

            let producer = Producer {
                channel,
                exchange: cfg.exchange_name.clone(),
                run_id: self.run_id.clone(),
                flags,
                tx_size: cfg.producer_tx_size,
                min_msg_size: cfg.min_msg_size,
                message_limit: cfg.message_limit,
                time_limit: cfg.time_limit,
                pacer: Pacer::new(cfg.rate_limit, cfg.sampling_interval, returns),
            };
            producer_connections.push(conn);
            producer_handles.push(tokio::spawn(producer.run()));
        }

        let mut first_failure = None;
        join_workers(producer_handles, &mut first_failure).await;
        for conn in producer_connections {
            let _ = conn.close().await;
        }
        join_workers(consumer_handles, &mut first_failure).await;
        for conn in consumer_connections {
            let _ = conn.close().await;
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Waits on every worker, keeping the first failure and logging the rest.
async fn join_workers(
    handles: Vec<JoinHandle<Result<(), BenchError>>>,
    first_failure: &mut Option<BenchError>,
) {
    for handle in handles {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(BenchError::Cancelled(e.to_string())),
        };
        if let Err(e) = outcome {
            if first_failure.is_none() {
                *first_failure = Some(e);
            } else {
                error!("additional worker failure: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests;
