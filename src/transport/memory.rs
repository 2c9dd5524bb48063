//! In-process loopback fabric.
//!
//! A small exchange/binding/queue fabric with the same channel surface as the
//! WebSocket backend, so scenario tests and smoke runs can drive the full
//! harness without a broker process. Direct exchanges match the routing key
//! exactly; fanout exchanges deliver to every bound queue.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use super::{Delivery, PublishFlags, ReturnNotice};
use crate::utils::error::BenchError;

/// Shared state of the loopback broker. Clone the `Arc` into every
/// [`MemoryConnection`] that should see the same topology.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
}

#[derive(Debug, Default)]
struct BrokerState {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, QueueState>,
}

#[derive(Debug)]
struct Exchange {
    kind: String,
    /// routing key -> bound queue names
    bindings: HashMap<String, HashSet<String>>,
}

#[derive(Debug)]
struct QueueState {
    sender: UnboundedSender<QueuedMessage>,
    receiver: Option<UnboundedReceiver<QueuedMessage>>,
    has_consumer: bool,
}

#[derive(Debug, Clone)]
struct QueuedMessage {
    routing_key: String,
    payload: Vec<u8>,
}

impl MemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn exchange_declare(&self, name: &str, kind: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .exchanges
            .entry(name.to_string())
            .or_insert_with(|| Exchange {
                kind: kind.to_string(),
                bindings: HashMap::new(),
            });
    }

    fn queue_declare(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.queues.entry(name.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            QueueState {
                sender,
                receiver: Some(receiver),
                has_consumer: false,
            }
        });
    }

    fn queue_bind(&self, queue: &str, exchange: &str, routing_key: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(ex) = state.exchanges.get_mut(exchange) {
            ex.bindings
                .entry(routing_key.to_string())
                .or_default()
                .insert(queue.to_string());
        }
    }

    fn consume(&self, queue: &str) -> Option<UnboundedReceiver<QueuedMessage>> {
        let mut state = self.state.lock().unwrap();
        let q = state.queues.get_mut(queue)?;
        q.has_consumer = true;
        q.receiver.take()
    }

    /// Routes one message to every matched queue. Returns a notice instead
    /// when a mandatory publish matched no binding, or an immediate publish
    /// found no live consumer on any matched queue.
    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        flags: PublishFlags,
    ) -> Option<ReturnNotice> {
        let state = self.state.lock().unwrap();

        let returned = |reply_text: &str| {
            Some(ReturnNotice {
                reply_text: reply_text.to_string(),
                routing_key: routing_key.to_string(),
            })
        };

        let Some(ex) = state.exchanges.get(exchange) else {
            return if flags.mandatory {
                returned("no such exchange")
            } else {
                None
            };
        };

        let matched: Vec<&String> = if ex.kind == "fanout" {
            ex.bindings.values().flatten().collect()
        } else {
            ex.bindings.get(routing_key).into_iter().flatten().collect()
        };

        if matched.is_empty() {
            return if flags.mandatory {
                returned("unroutable")
            } else {
                None
            };
        }

        if flags.immediate {
            let consumable = matched
                .iter()
                .any(|name| state.queues.get(*name).is_some_and(|q| q.has_consumer));
            if !consumable {
                return returned("no consumer");
            }
        }

        for name in &matched {
            if let Some(q) = state.queues.get(*name) {
                let _ = q.sender.send(QueuedMessage {
                    routing_key: routing_key.to_string(),
                    payload: payload.clone(),
                });
            }
        }
        None
    }
}

/// A logical connection into the loopback broker.
pub struct MemoryConnection {
    broker: Arc<MemoryBroker>,
}

impl MemoryConnection {
    pub fn new(broker: Arc<MemoryBroker>) -> Self {
        Self { broker }
    }

    pub fn create_channel(&self) -> MemoryChannel {
        let (returns_tx, returns_rx) = mpsc::unbounded_channel();
        MemoryChannel {
            broker: self.broker.clone(),
            deliveries: None,
            prefetch: None,
            auto_ack: false,
            next_tag: 0,
            returns_tx,
            returns_rx: Some(returns_rx),
        }
    }

    pub fn close(self) -> Result<(), BenchError> {
        Ok(())
    }
}

pub struct MemoryChannel {
    broker: Arc<MemoryBroker>,
    deliveries: Option<UnboundedReceiver<QueuedMessage>>,
    prefetch: Option<Arc<Semaphore>>,
    auto_ack: bool,
    next_tag: u64,
    returns_tx: UnboundedSender<ReturnNotice>,
    returns_rx: Option<UnboundedReceiver<ReturnNotice>>,
}

impl MemoryChannel {
    /// Transactions are accepted but are a no-op in the loopback fabric.
    pub fn tx_select(&mut self) -> Result<(), BenchError> {
        Ok(())
    }

    pub fn tx_commit(&mut self) -> Result<(), BenchError> {
        Ok(())
    }

    pub fn exchange_declare(&mut self, exchange: &str, kind: &str) -> Result<(), BenchError> {
        self.broker.exchange_declare(exchange, kind);
        Ok(())
    }

    /// Declares a fresh private queue and returns its generated name.
    /// Durability is meaningless in memory and is ignored.
    pub fn queue_declare(&mut self, _durable: bool) -> Result<String, BenchError> {
        let name = format!("gen-{}", Uuid::new_v4());
        self.broker.queue_declare(&name);
        Ok(name)
    }

    pub fn queue_bind(
        &mut self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BenchError> {
        self.broker.queue_bind(queue, exchange, routing_key);
        Ok(())
    }

    /// Prefetch accounting: one semaphore permit per unacked delivery.
    /// Must be called before `consume` to take effect, as on the wire.
    pub fn qos(&mut self, prefetch: u32) -> Result<(), BenchError> {
        if prefetch > 0 {
            self.prefetch = Some(Arc::new(Semaphore::new(prefetch as usize)));
        }
        Ok(())
    }

    pub fn consume(&mut self, queue: &str, auto_ack: bool) -> Result<(), BenchError> {
        self.auto_ack = auto_ack;
        self.deliveries = Some(
            self.broker
                .consume(queue)
                .ok_or(BenchError::ChannelClosed("queue already consumed"))?,
        );
        Ok(())
    }

    pub fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        flags: PublishFlags,
    ) -> Result<(), BenchError> {
        if let Some(notice) = self.broker.publish(exchange, routing_key, payload, flags) {
            let _ = self.returns_tx.send(notice);
        }
        Ok(())
    }

    /// Blocks until the next delivery. With a prefetch limit and manual
    /// acknowledgement, blocks while the unacked window is full.
    pub async fn next_delivery(&mut self) -> Result<Delivery, BenchError> {
        if !self.auto_ack {
            if let Some(semaphore) = &self.prefetch {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| BenchError::ChannelClosed("prefetch window closed"))?;
                permit.forget();
            }
        }
        let rx = self
            .deliveries
            .as_mut()
            .ok_or(BenchError::ChannelClosed("no active consumer"))?;
        let msg = rx
            .recv()
            .await
            .ok_or(BenchError::ChannelClosed("queue torn down"))?;
        self.next_tag += 1;
        Ok(Delivery {
            delivery_tag: self.next_tag,
            routing_key: msg.routing_key,
            payload: msg.payload,
        })
    }

    pub fn ack(&mut self, _delivery_tag: u64) -> Result<(), BenchError> {
        if let Some(semaphore) = &self.prefetch {
            semaphore.add_permits(1);
        }
        Ok(())
    }

    pub fn take_returns(&mut self) -> Option<UnboundedReceiver<ReturnNotice>> {
        self.returns_rx.take()
    }
}
