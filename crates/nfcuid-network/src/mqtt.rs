//! MQTT transport.
//!
//! Wraps a `rumqttc` client for the two ways nfcuid uses a broker: receiving
//! UID payloads on an input topic and publishing formatted UIDs on an output
//! topic.
//!
//! # Architecture
//!
//! ```text
//! MqttConnection::connect
//!     │
//!     ├─> handshake: poll until CONNACK (and SUBACK when subscribing)
//!     │
//!     └─> event task ──poll──> rumqttc EventLoop ──(TCP)──> Broker
//!              │
//!              └─> unbounded queue ──> MqttIngestLoop
//! ```
//!
//! Connection and subscription failures surface from
//! [`MqttConnection::connect`]. After the handshake the event task keeps the
//! session alive and reconnects on its own; publishes are fire-and-forget
//! at QoS 0.

use nfcuid_core::MqttConfig;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS, SubscribeReasonCode,
};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Capacity of the client request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Pause before the event task polls again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Errors that can occur while talking to the broker
#[derive(Debug, Error)]
pub enum MqttError {
    /// Broker unreachable or refused the connection
    #[error("MQTT connect to {broker} failed: {message}")]
    Connect { broker: String, message: String },

    /// Broker rejected the subscription
    #[error("MQTT subscribe to {topic} failed: {message}")]
    Subscribe { topic: String, message: String },

    /// Publish request could not be queued
    #[error("MQTT publish to {topic} failed: {message}")]
    Publish { topic: String, message: String },
}

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Payload as text, with invalid UTF-8 replaced.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Build client options: client id, credentials and a persistent session.
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(config.client_id.clone(), config.host(), config.port);
    options.set_keep_alive(config.keep_alive);
    options.set_clean_session(false);

    if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
        options.set_credentials(username, config.password.clone().unwrap_or_default());
    }

    options
}

/// Established broker session.
pub struct MqttConnection {
    client: AsyncClient,
    inbound: Option<mpsc::UnboundedReceiver<InboundMessage>>,
    event_task: JoinHandle<()>,
    broker: String,
}

impl MqttConnection {
    /// Connect to the broker and optionally subscribe to `subscribe` at QoS 0.
    ///
    /// Returns only after the broker acknowledged the connection (and the
    /// subscription).
    ///
    /// # Errors
    ///
    /// Returns `MqttError::Connect` if the broker cannot be reached or
    /// refuses the client, `MqttError::Subscribe` if the subscription is
    /// rejected.
    pub async fn connect(config: &MqttConfig, subscribe: Option<&str>) -> Result<Self, MqttError> {
        let broker = config.broker_url();
        info!(%broker, client_id = %config.client_id, "Connecting to MQTT broker");

        let (client, mut eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(topic) = subscribe {
            client
                .subscribe(topic, QoS::AtMostOnce)
                .await
                .map_err(|e| MqttError::Subscribe {
                    topic: topic.to_string(),
                    message: e.to_string(),
                })?;
        }

        handshake(&mut eventloop, &broker, subscribe, &tx).await?;
        info!(%broker, "Connected to MQTT broker");
        if let Some(topic) = subscribe {
            info!(topic, "Subscribed");
        }

        let event_task = tokio::spawn(drive(eventloop, tx));

        Ok(Self {
            client,
            inbound: Some(rx),
            event_task,
            broker,
        })
    }

    /// Take the queue of messages received on the subscribed topic.
    ///
    /// Returns `None` after the first call.
    pub fn take_inbound(&mut self) -> Option<mpsc::UnboundedReceiver<InboundMessage>> {
        self.inbound.take()
    }

    /// Publisher bound to `topic`, sharing this session.
    pub fn publisher(&self, topic: impl Into<String>) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
            topic: topic.into(),
        }
    }

    /// Send DISCONNECT and give the event task `grace` to flush it.
    pub async fn disconnect(mut self, grace: Duration) {
        if let Err(e) = self.client.try_disconnect() {
            warn!("Failed to queue MQTT disconnect: {}", e);
        }

        match tokio::time::timeout(grace, &mut self.event_task).await {
            Ok(_) => debug!(broker = %self.broker, "MQTT event loop stopped"),
            Err(_) => {
                warn!(
                    "MQTT disconnect grace period ({}ms) expired",
                    grace.as_millis()
                );
                self.event_task.abort();
            }
        }
    }
}

/// Publishes formatted UIDs on one topic.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

impl std::fmt::Debug for MqttPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttPublisher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl MqttPublisher {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Queue `text` for publishing at QoS 0, not retained.
    ///
    /// Never waits: while the event task is reconnecting the request queue
    /// can fill up, and a full queue is reported instead of blocking the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `MqttError::Publish` if the request queue is full or the
    /// session's event loop is gone.
    pub fn publish(&self, text: &str) -> Result<(), MqttError> {
        trace!(topic = %self.topic, "Publishing");
        self.client
            .try_publish(self.topic.as_str(), QoS::AtMostOnce, false, text.as_bytes().to_vec())
            .map_err(|e| MqttError::Publish {
                topic: self.topic.clone(),
                message: e.to_string(),
            })
    }
}

/// Poll until the broker acknowledged the connection and, if requested,
/// the subscription.
async fn handshake(
    eventloop: &mut EventLoop,
    broker: &str,
    subscribe: Option<&str>,
    tx: &mpsc::UnboundedSender<InboundMessage>,
) -> Result<(), MqttError> {
    let mut connected = false;
    let mut subscribed = subscribe.is_none();

    while !(connected && subscribed) {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code != ConnectReturnCode::Success {
                    return Err(MqttError::Connect {
                        broker: broker.to_string(),
                        message: format!("{:?}", ack.code),
                    });
                }
                debug!(session_present = ack.session_present, "CONNACK received");
                connected = true;
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    return Err(MqttError::Subscribe {
                        topic: subscribe.unwrap_or_default().to_string(),
                        message: "rejected by broker".to_string(),
                    });
                }
                subscribed = true;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                // Queued messages of a persistent session can beat the SUBACK.
                let _ = tx.send(InboundMessage::new(publish.topic, publish.payload.to_vec()));
            }
            Ok(_) => {}
            Err(e) => {
                return Err(MqttError::Connect {
                    broker: broker.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Keep the session running and feed received publishes into the queue.
async fn drive(mut eventloop: EventLoop, tx: mpsc::UnboundedSender<InboundMessage>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                trace!(topic = %publish.topic, len = publish.payload.len(), "Received publish");
                if tx
                    .send(InboundMessage::new(publish.topic, publish.payload.to_vec()))
                    .is_err()
                {
                    trace!("Inbound queue closed, dropping message");
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("MQTT disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                debug!("MQTT client dropped, stopping event loop");
                break;
            }
            Err(e) => {
                warn!("MQTT connection error: {}, retrying", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
