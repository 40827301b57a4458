//! Run configuration.
//!
//! A [`Config`] is built once from the command line and handed to every
//! component constructor. Nothing reads settings from global state.
//!
//! # Examples
//!
//! ```
//! use nfcuid_core::{Config, InputMode, OutputTarget, DeviceSelection};
//!
//! let config = Config {
//!     input: InputMode::Reader { device: DeviceSelection::Index(1) },
//!     output: OutputTarget::Keyboard,
//!     ..Config::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::constants::{
    DEFAULT_MQTT_CLIENT_ID, DEFAULT_MQTT_KEEP_ALIVE_SECS, DEFAULT_MQTT_PORT,
};
use crate::types::FormatOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which reader to use when several are plugged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceSelection {
    /// Ask the operator interactively.
    #[default]
    Prompt,

    /// 1-based index into the reader list.
    Index(usize),
}

impl DeviceSelection {
    /// Map the command line value, where 0 means "ask".
    pub fn from_flag(device: usize) -> Self {
        if device == 0 {
            Self::Prompt
        } else {
            Self::Index(device)
        }
    }
}

/// Where UIDs come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// Card taps on a PC/SC reader.
    Reader { device: DeviceSelection },

    /// Payloads published on an MQTT topic.
    Mqtt { topic: String },
}

impl Default for InputMode {
    fn default() -> Self {
        Self::Reader {
            device: DeviceSelection::Prompt,
        }
    }
}

/// Where formatted UIDs go. Exactly one target is active per run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputTarget {
    /// Typed as keyboard input.
    #[default]
    Keyboard,

    /// Published on an MQTT topic at QoS 0.
    MqttPublish { topic: String },

    /// Sent as a line to a TCP peer that answers `OK`.
    Tcp(TcpConfig),
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host, with or without a `tcp://` prefix.
    pub server: String,

    pub port: u16,

    pub username: Option<String>,

    #[serde(skip_serializing, default)]
    pub password: Option<String>,

    pub client_id: String,

    pub keep_alive: Duration,
}

impl MqttConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: DEFAULT_MQTT_PORT,
            username: None,
            password: None,
            client_id: DEFAULT_MQTT_CLIENT_ID.to_string(),
            keep_alive: Duration::from_secs(DEFAULT_MQTT_KEEP_ALIVE_SECS),
        }
    }

    /// Broker host without any `tcp://` scheme prefix.
    pub fn host(&self) -> &str {
        self.server
            .strip_prefix("tcp://")
            .unwrap_or(&self.server)
            .trim_end_matches('/')
    }

    /// `tcp://host:port`, as printed at startup.
    pub fn broker_url(&self) -> String {
        format!("tcp://{}:{}", self.host(), self.port)
    }
}

/// TCP peer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    pub address: String,

    pub port: u16,

    /// Per-attempt I/O timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl TcpConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Complete, immutable run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    pub format: FormatOptions,
    pub input: InputMode,
    pub output: OutputTarget,
    pub mqtt: Option<MqttConfig>,
    pub debug: bool,
}

impl Config {
    /// Whether any part of the run talks to a broker.
    pub fn uses_mqtt(&self) -> bool {
        matches!(self.input, InputMode::Mqtt { .. })
            || matches!(self.output, OutputTarget::MqttPublish { .. })
    }

    /// Reject combinations that cannot run.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingConfig` when MQTT is used without broker
    /// settings, and `Error::Config` for empty topics or TCP targets.
    pub fn validate(&self) -> Result<()> {
        if self.uses_mqtt() {
            let mqtt = self
                .mqtt
                .as_ref()
                .ok_or_else(|| Error::MissingConfig("mqtt-server".to_string()))?;
            if mqtt.host().is_empty() {
                return Err(Error::MissingConfig("mqtt-server".to_string()));
            }
            if mqtt.client_id.is_empty() {
                return Err(Error::Config("MQTT client id must not be empty".to_string()));
            }
        }

        if let InputMode::Mqtt { topic } = &self.input {
            if topic.is_empty() {
                return Err(Error::Config("MQTT input topic must not be empty".to_string()));
            }
        }

        match &self.output {
            OutputTarget::Keyboard => {}
            OutputTarget::MqttPublish { topic } => {
                if topic.is_empty() {
                    return Err(Error::Config(
                        "MQTT output topic must not be empty".to_string(),
                    ));
                }
            }
            OutputTarget::Tcp(tcp) => {
                if tcp.address.is_empty() {
                    return Err(Error::MissingConfig("tcp-address".to_string()));
                }
                if tcp.port == 0 {
                    return Err(Error::Config("TCP port must not be 0".to_string()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mqtt_input() -> Config {
        Config {
            input: InputMode::Mqtt {
                topic: "nfcuid/reader".to_string(),
            },
            mqtt: Some(MqttConfig::new("broker.local")),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_is_keyboard_reader() {
        let config = Config::default();
        assert_eq!(
            config.input,
            InputMode::Reader {
                device: DeviceSelection::Prompt
            }
        );
        assert_eq!(config.output, OutputTarget::Keyboard);
        assert!(!config.uses_mqtt());
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(0, DeviceSelection::Prompt)]
    #[case(1, DeviceSelection::Index(1))]
    #[case(7, DeviceSelection::Index(7))]
    fn test_device_selection_from_flag(#[case] flag: usize, #[case] expected: DeviceSelection) {
        assert_eq!(DeviceSelection::from_flag(flag), expected);
    }

    #[rstest]
    #[case("broker.local", "broker.local", "tcp://broker.local:1883")]
    #[case("tcp://broker.local", "broker.local", "tcp://broker.local:1883")]
    #[case("tcp://10.0.0.2/", "10.0.0.2", "tcp://10.0.0.2:1883")]
    fn test_mqtt_host(#[case] server: &str, #[case] host: &str, #[case] url: &str) {
        let mqtt = MqttConfig::new(server);
        assert_eq!(mqtt.host(), host);
        assert_eq!(mqtt.broker_url(), url);
    }

    #[test]
    fn test_mqtt_input_valid() {
        assert!(mqtt_input().validate().is_ok());
    }

    #[test]
    fn test_mqtt_input_without_broker() {
        let config = Config {
            mqtt: None,
            ..mqtt_input()
        };
        assert_eq!(
            config.validate(),
            Err(Error::MissingConfig("mqtt-server".to_string()))
        );
    }

    #[test]
    fn test_mqtt_input_empty_server() {
        let config = Config {
            mqtt: Some(MqttConfig::new("tcp://")),
            ..mqtt_input()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mqtt_input_empty_topic() {
        let config = Config {
            input: InputMode::Mqtt {
                topic: String::new(),
            },
            ..mqtt_input()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_mqtt_output_needs_broker() {
        let config = Config {
            output: OutputTarget::MqttPublish {
                topic: "out".to_string(),
            },
            ..Config::default()
        };
        assert!(config.uses_mqtt());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tcp_output_validation() {
        let mut config = Config {
            output: OutputTarget::Tcp(TcpConfig::new("127.0.0.1", 9000)),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        config.output = OutputTarget::Tcp(TcpConfig::new("", 9000));
        assert!(config.validate().is_err());

        config.output = OutputTarget::Tcp(TcpConfig::new("127.0.0.1", 0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_never_serialized() {
        let mut mqtt = MqttConfig::new("broker.local");
        mqtt.username = Some("kiosk".to_string());
        mqtt.password = Some("hunter2".to_string());

        let json = serde_json::to_string(&mqtt).unwrap();
        assert!(json.contains("kiosk"));
        assert!(!json.contains("hunter2"));
    }
}
