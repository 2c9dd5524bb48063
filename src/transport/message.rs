use serde::{Deserialize, Serialize};

/// Frames sent from the benchmark to the broker.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    ExchangeDeclare {
        exchange: String,
        kind: String,
    },
    QueueDeclare {
        queue: String,
        durable: bool,
        exclusive: bool,
        auto_delete: bool,
    },
    QueueBind {
        queue: String,
        exchange: String,
        routing_key: String,
    },
    Qos {
        channel: u64,
        prefetch: u32,
    },
    Consume {
        queue: String,
        consumer_tag: String,
        auto_ack: bool,
    },
    Publish {
        channel: u64,
        exchange: String,
        routing_key: String,
        mandatory: bool,
        immediate: bool,
        persistent: bool,
        payload: Vec<u8>,
    },
    Ack {
        consumer_tag: String,
        delivery_tag: u64,
    },
    TxSelect {
        channel: u64,
    },
    TxCommit {
        channel: u64,
    },
}

/// Frames sent from the broker back to the benchmark.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Delivery {
        consumer_tag: String,
        delivery_tag: u64,
        routing_key: String,
        payload: Vec<u8>,
    },
    Return {
        channel: u64,
        reply_text: String,
        routing_key: String,
    },
    Error {
        message: String,
    },
}
