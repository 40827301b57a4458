//! Core types for nfcuid.
//!
//! Holds everything the acquisition pipeline shares and that has no I/O:
//! the output character set, formatting options, the UID formatter, the
//! MQTT payload decoder and the immutable run configuration.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod payload;
pub mod types;

pub use config::{Config, DeviceSelection, InputMode, MqttConfig, OutputTarget, TcpConfig};
pub use error::{Error, Result};
pub use format::format_uid;
pub use payload::decode_payload;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
