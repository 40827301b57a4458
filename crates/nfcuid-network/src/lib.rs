//! Network transports for nfcuid
//!
//! This crate provides the two network paths a formatted UID can take, and
//! the broker session used when UIDs arrive over MQTT instead of from a
//! reader.
//!
//! # Components
//!
//! - **TcpSink**: line-oriented delivery to a peer that acknowledges with `OK`,
//!   with a bounded number of attempts
//! - **MqttConnection**: broker session, optionally subscribed to an input topic
//! - **MqttPublisher**: QoS 0 publishing of formatted UIDs
//!
//! # Example
//!
//! ```no_run
//! use nfcuid_core::MqttConfig;
//! use nfcuid_network::MqttConnection;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MqttConfig::new("tcp://broker.local");
//! let mut connection = MqttConnection::connect(&config, Some("nfcuid/reader")).await?;
//!
//! let mut inbound = connection.take_inbound().expect("first call");
//! if let Some(message) = inbound.recv().await {
//!     println!("{}", message.payload_str());
//! }
//!
//! connection.disconnect(Duration::from_millis(250)).await;
//! # Ok(())
//! # }
//! ```

mod mqtt;
mod tcp;

pub use mqtt::{InboundMessage, MqttConnection, MqttError, MqttPublisher, mqtt_options};
pub use tcp::{TcpSink, TcpSinkError};
