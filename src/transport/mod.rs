//! The messaging capability used by the benchmark workers.
//!
//! Two backends share one channel surface: a WebSocket client speaking the
//! broker's JSON frame protocol, and an in-process loopback fabric used by
//! tests and smoke runs. Workers only ever see [`Connection`] and
//! [`Channel`].

pub mod memory;
pub mod message;
pub mod websocket;


use tokio::sync::mpsc::UnboundedReceiver;

use crate::utils::error::BenchError;
use memory::{MemoryChannel, MemoryConnection};
use websocket::{WsChannel, WsConnection};

/// One message handed to a consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

/// Broker notification that a mandatory/immediate publish was not delivered.
#[derive(Debug, Clone)]
pub struct ReturnNotice {
    pub reply_text: String,
    pub routing_key: String,
}

/// Delivery modifiers, resolved once per producer from the `--flag` list.
///
/// Resolution is a membership test: unknown flag names are silently ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishFlags {
    pub mandatory: bool,
    pub immediate: bool,
    pub persistent: bool,
}

impl PublishFlags {
    pub fn resolve(flags: &[String]) -> Self {
        Self {
            mandatory: flags.iter().any(|f| f == "mandatory"),
            immediate: flags.iter().any(|f| f == "immediate"),
            persistent: flags.iter().any(|f| f == "persistent"),
        }
    }
}

/// A physical broker connection: one per producer, and one per consumer or
/// one shared by all consumers depending on the connection plan.
pub enum Connection {
    Ws(WsConnection),
    Memory(MemoryConnection),
}

impl Connection {
    pub fn create_channel(&self) -> Channel {
        match self {
            Connection::Ws(conn) => Channel::Ws(conn.create_channel()),
            Connection::Memory(conn) => Channel::Memory(conn.create_channel()),
        }
    }

    /// Closes the physical connection. Workers still holding channels see
    /// their next operation fail.
    pub async fn close(self) -> Result<(), BenchError> {
        match self {
            Connection::Ws(conn) => conn.close().await,
            Connection::Memory(conn) => conn.close(),
        }
    }
}

/// A logical channel multiplexed over a connection. Each worker owns exactly
/// one; channels are not shared between workers.
pub enum Channel {
    Ws(WsChannel),
    Memory(MemoryChannel),
}

impl Channel {
    pub fn tx_select(&mut self) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.tx_select(),
            Channel::Memory(c) => c.tx_select(),
        }
    }

    pub fn tx_commit(&mut self) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.tx_commit(),
            Channel::Memory(c) => c.tx_commit(),
        }
    }

    pub fn exchange_declare(&mut self, exchange: &str, kind: &str) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.exchange_declare(exchange, kind),
            Channel::Memory(c) => c.exchange_declare(exchange, kind),
        }
    }

    pub fn queue_declare(&mut self, durable: bool) -> Result<String, BenchError> {
        match self {
            Channel::Ws(c) => c.queue_declare(durable),
            Channel::Memory(c) => c.queue_declare(durable),
        }
    }

    pub fn queue_bind(
        &mut self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.queue_bind(queue, exchange, routing_key),
            Channel::Memory(c) => c.queue_bind(queue, exchange, routing_key),
        }
    }

    pub fn qos(&mut self, prefetch: u32) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.qos(prefetch),
            Channel::Memory(c) => c.qos(prefetch),
        }
    }

    pub fn consume(&mut self, queue: &str, auto_ack: bool) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.consume(queue, auto_ack),
            Channel::Memory(c) => c.consume(queue, auto_ack),
        }
    }

    pub fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        flags: PublishFlags,
    ) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.publish(exchange, routing_key, payload, flags),
            Channel::Memory(c) => c.publish(exchange, routing_key, payload, flags),
        }
    }

    pub fn ack(&mut self, delivery_tag: u64) -> Result<(), BenchError> {
        match self {
            Channel::Ws(c) => c.ack(delivery_tag),
            Channel::Memory(c) => c.ack(delivery_tag),
        }
    }

    /// Blocks until the next delivery arrives or the channel dies.
    pub async fn next_delivery(&mut self) -> Result<Delivery, BenchError> {
        match self {
            Channel::Ws(c) => c.next_delivery().await,
            Channel::Memory(c) => c.next_delivery().await,
        }
    }

    /// Hands out the return-notice stream. The harness wires it to the
    /// producer's return counter; it can be taken only once.
    pub fn take_returns(&mut self) -> Option<UnboundedReceiver<ReturnNotice>> {
        match self {
            Channel::Ws(c) => c.take_returns(),
            Channel::Memory(c) => c.take_returns(),
        }
    }
}
