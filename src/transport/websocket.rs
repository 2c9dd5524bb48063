//! WebSocket client backend.
//!
//! One physical broker connection per [`WsConnection`]. A writer task drains
//! an mpsc of outgoing frames into the sink; a reader task dispatches broker
//! frames to the owning channel: deliveries by consumer tag, return notices
//! by channel id. Control frames are fire-and-forget: queues are named
//! client-side so no declaration needs a reply round-trip.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, warn};
use tungstenite::Bytes;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use super::message::{ClientFrame, ServerFrame};
use super::{Delivery, PublishFlags, ReturnNotice};
use crate::utils::error::BenchError;

/// Routing tables the reader task dispatches into.
#[derive(Default)]
struct Registry {
    consumers: Mutex<HashMap<String, UnboundedSender<Delivery>>>,
    returns: Mutex<HashMap<u64, UnboundedSender<ReturnNotice>>>,
}

pub struct WsConnection {
    writer: UnboundedSender<WsMessage>,
    registry: Arc<Registry>,
    next_channel_id: AtomicU64,
}

impl WsConnection {
    /// Connects to `ws://host:port`. `frame_max` caps the websocket frame
    /// size and `heartbeat` enables a periodic ping task; zero leaves each
    /// at the protocol default.
    pub async fn connect(
        host: &str,
        port: u16,
        frame_max: usize,
        heartbeat: u64,
    ) -> Result<Self, BenchError> {
        let url = format!("ws://{host}:{port}");
        let mut ws_config = WebSocketConfig::default();
        if frame_max > 0 {
            ws_config = ws_config.max_frame_size(Some(frame_max));
        }
        let (ws_stream, _response) =
            connect_async_with_config(&url, Some(ws_config), false).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let (writer, mut writer_rx) = mpsc::unbounded_channel::<WsMessage>();
        tokio::spawn(async move {
            while let Some(msg) = writer_rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    error!("websocket send failed: {e}");
                    break;
                }
            }
        });

        if heartbeat > 0 {
            let writer = writer.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(heartbeat));
                loop {
                    ticker.tick().await;
                    if writer.send(WsMessage::Ping(Bytes::new())).is_err() {
                        break;
                    }
                }
            });
        }

        let registry = Arc::new(Registry::default());
        {
            let registry = registry.clone();
            tokio::spawn(async move {
                while let Some(msg) = ws_receiver.next().await {
                    let msg = match msg {
                        Ok(msg) => msg,
                        Err(e) => {
                            error!("websocket receive failed: {e}");
                            break;
                        }
                    };
                    if !msg.is_text() {
                        continue;
                    }
                    let text = match msg.to_text() {
                        Ok(text) => text,
                        Err(_) => continue,
                    };
                    match serde_json::from_str::<ServerFrame>(text) {
                        Ok(ServerFrame::Delivery {
                            consumer_tag,
                            delivery_tag,
                            routing_key,
                            payload,
                        }) => {
                            let consumers = registry.consumers.lock().unwrap();
                            if let Some(sender) = consumers.get(&consumer_tag) {
                                let _ = sender.send(Delivery {
                                    delivery_tag,
                                    routing_key,
                                    payload,
                                });
                            } else {
                                warn!("delivery for unknown consumer tag {consumer_tag}");
                            }
                        }
                        Ok(ServerFrame::Return {
                            channel,
                            reply_text,
                            routing_key,
                        }) => {
                            let returns = registry.returns.lock().unwrap();
                            if let Some(sender) = returns.get(&channel) {
                                let _ = sender.send(ReturnNotice {
                                    reply_text,
                                    routing_key,
                                });
                            }
                        }
                        Ok(ServerFrame::Error { message }) => {
                            error!("broker signalled error: {message}");
                            break;
                        }
                        Err(e) => {
                            debug!("ignoring unparseable frame: {e} | {text}");
                        }
                    }
                }
                // Dropping the delivery senders is what wakes workers
                // blocked in next_delivery when the connection dies.
                registry.consumers.lock().unwrap().clear();
                registry.returns.lock().unwrap().clear();
            });
        }

        Ok(Self {
            writer,
            registry,
            next_channel_id: AtomicU64::new(1),
        })
    }

    pub fn create_channel(&self) -> WsChannel {
        let channel_id = self.next_channel_id.fetch_add(1, Ordering::Relaxed);
        let (returns_tx, returns_rx) = mpsc::unbounded_channel();
        self.registry
            .returns
            .lock()
            .unwrap()
            .insert(channel_id, returns_tx);
        WsChannel {
            id: channel_id,
            writer: self.writer.clone(),
            registry: self.registry.clone(),
            deliveries: None,
            consumer_tag: None,
            returns_rx: Some(returns_rx),
        }
    }

    pub async fn close(self) -> Result<(), BenchError> {
        self.writer
            .send(WsMessage::Close(None))
            .map_err(|_| BenchError::ChannelClosed("connection already closed"))
    }
}

pub struct WsChannel {
    id: u64,
    writer: UnboundedSender<WsMessage>,
    registry: Arc<Registry>,
    deliveries: Option<UnboundedReceiver<Delivery>>,
    consumer_tag: Option<String>,
    returns_rx: Option<UnboundedReceiver<ReturnNotice>>,
}

impl WsChannel {
    fn send_frame(&self, frame: &ClientFrame) -> Result<(), BenchError> {
        let text = serde_json::to_string(frame)?;
        self.writer
            .send(WsMessage::text(text))
            .map_err(|_| BenchError::ChannelClosed("websocket writer gone"))
    }

    pub fn tx_select(&mut self) -> Result<(), BenchError> {
        self.send_frame(&ClientFrame::TxSelect { channel: self.id })
    }

    pub fn tx_commit(&mut self) -> Result<(), BenchError> {
        self.send_frame(&ClientFrame::TxCommit { channel: self.id })
    }

    pub fn exchange_declare(&mut self, exchange: &str, kind: &str) -> Result<(), BenchError> {
        self.send_frame(&ClientFrame::ExchangeDeclare {
            exchange: exchange.to_string(),
            kind: kind.to_string(),
        })
    }

    /// Declares a private, exclusive, non-auto-deleted queue and returns its
    /// client-generated name.
    pub fn queue_declare(&mut self, durable: bool) -> Result<String, BenchError> {
        let queue = format!("gen-{}", Uuid::new_v4());
        self.send_frame(&ClientFrame::QueueDeclare {
            queue: queue.clone(),
            durable,
            exclusive: true,
            auto_delete: false,
        })?;
        Ok(queue)
    }

    pub fn queue_bind(
        &mut self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BenchError> {
        self.send_frame(&ClientFrame::QueueBind {
            queue: queue.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        })
    }

    pub fn qos(&mut self, prefetch: u32) -> Result<(), BenchError> {
        self.send_frame(&ClientFrame::Qos {
            channel: self.id,
            prefetch,
        })
    }

    pub fn consume(&mut self, queue: &str, auto_ack: bool) -> Result<(), BenchError> {
        let consumer_tag = format!("ctag-{}", Uuid::new_v4());
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry
            .consumers
            .lock()
            .unwrap()
            .insert(consumer_tag.clone(), tx);
        self.deliveries = Some(rx);
        self.send_frame(&ClientFrame::Consume {
            queue: queue.to_string(),
            consumer_tag: consumer_tag.clone(),
            auto_ack,
        })?;
        self.consumer_tag = Some(consumer_tag);
        Ok(())
    }

    pub fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        flags: PublishFlags,
    ) -> Result<(), BenchError> {
        self.send_frame(&ClientFrame::Publish {
            channel: self.id,
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            mandatory: flags.mandatory,
            immediate: flags.immediate,
            persistent: flags.persistent,
            payload,
        })
    }

    pub fn ack(&mut self, delivery_tag: u64) -> Result<(), BenchError> {
        let consumer_tag = self
            .consumer_tag
            .clone()
            .ok_or(BenchError::ChannelClosed("ack without active consumer"))?;
        self.send_frame(&ClientFrame::Ack {
            consumer_tag,
            delivery_tag,
        })
    }

    pub async fn next_delivery(&mut self) -> Result<Delivery, BenchError> {
        let rx = self
            .deliveries
            .as_mut()
            .ok_or(BenchError::ChannelClosed("no active consumer"))?;
        rx.recv()
            .await
            .ok_or(BenchError::ChannelClosed("broker connection lost"))
    }

    pub fn take_returns(&mut self) -> Option<UnboundedReceiver<ReturnNotice>> {
        self.returns_rx.take()
    }
}
