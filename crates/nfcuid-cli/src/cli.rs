//! Command line definition.

use clap::Parser;
use nfcuid_core::constants::{
    DEFAULT_MQTT_CLIENT_ID, DEFAULT_MQTT_OUT_TOPIC, DEFAULT_MQTT_PORT, DEFAULT_MQTT_TOPIC,
};
use nfcuid_core::{
    CharFlag, Config, DeviceSelection, FormatOptions, InputMode, MqttConfig, OutputTarget,
    TcpConfig,
};
use std::time::Duration;

/// Read NFC card UIDs and emit them as keystrokes, MQTT messages or TCP lines
#[derive(Debug, Parser)]
#[command(name = "nfcuid", version, about)]
pub struct Cli {
    /// Character appended after the UID (none, space, comma, colon, hyphen, tab, newline)
    #[arg(long, default_value_t = CharFlag::None)]
    pub end_char: CharFlag,

    /// Character inserted between bytes (none, space, comma, colon, hyphen, tab, newline)
    #[arg(long, default_value_t = CharFlag::None)]
    pub in_char: CharFlag,

    /// Upper case hex digits
    #[arg(long)]
    pub caps_lock: bool,

    /// Reverse byte order
    #[arg(long)]
    pub reverse: bool,

    /// Render each byte as a three digit decimal
    #[arg(long)]
    pub decimal: bool,

    /// Reader number to use; 0 asks interactively
    #[arg(long, default_value_t = 0)]
    pub device: usize,

    /// Render the whole UID as one decimal number
    #[arg(long = "getasdecimal")]
    pub get_as_decimal: bool,

    /// Take UIDs from the MQTT input topic instead of a reader
    #[arg(long, visible_alias = "mqtt-activated")]
    pub mqtt_in: bool,

    /// Publish UIDs on the MQTT output topic
    #[arg(long, conflicts_with = "tcp_out")]
    pub mqtt_out: bool,

    /// MQTT broker host, optionally prefixed with tcp://
    #[arg(long, default_value = "")]
    pub mqtt_server: String,

    #[arg(long, default_value_t = DEFAULT_MQTT_PORT)]
    pub mqtt_port: u16,

    #[arg(long)]
    pub mqtt_user: Option<String>,

    #[arg(long, env = "NFCUID_MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,

    /// Topic UIDs are read from
    #[arg(long, default_value = DEFAULT_MQTT_TOPIC)]
    pub mqtt_topic: String,

    /// Topic UIDs are published on
    #[arg(long, default_value = DEFAULT_MQTT_OUT_TOPIC)]
    pub mqtt_out_topic: String,

    #[arg(long, default_value = DEFAULT_MQTT_CLIENT_ID)]
    pub mqtt_id: String,

    /// Send UIDs to a TCP peer that answers OK
    #[arg(long)]
    pub tcp_out: bool,

    #[arg(long, default_value = "")]
    pub tcp_address: String,

    #[arg(long, default_value_t = 0)]
    pub tcp_port: u16,

    /// Per-attempt TCP I/O timeout; waits indefinitely when unset
    #[arg(long)]
    pub tcp_timeout_ms: Option<u64>,

    /// Print output instead of typing it and log at debug level
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Convert the parsed flags into the run configuration.
    ///
    /// Does not validate; call [`Config::validate`] on the result.
    pub fn into_config(self) -> Config {
        let format = FormatOptions {
            end_char: self.end_char,
            in_char: self.in_char,
            caps_lock: self.caps_lock,
            decimal: self.decimal,
            reverse: self.reverse,
            get_as_decimal: self.get_as_decimal,
        };

        let input = if self.mqtt_in {
            InputMode::Mqtt {
                topic: self.mqtt_topic,
            }
        } else {
            InputMode::Reader {
                device: DeviceSelection::from_flag(self.device),
            }
        };

        let output = if self.mqtt_out {
            OutputTarget::MqttPublish {
                topic: self.mqtt_out_topic,
            }
        } else if self.tcp_out {
            let mut tcp = TcpConfig::new(self.tcp_address, self.tcp_port);
            if let Some(ms) = self.tcp_timeout_ms {
                tcp = tcp.with_timeout(Duration::from_millis(ms));
            }
            OutputTarget::Tcp(tcp)
        } else {
            OutputTarget::Keyboard
        };

        let mqtt = (!self.mqtt_server.is_empty()).then(|| {
            let mut mqtt = MqttConfig::new(self.mqtt_server);
            mqtt.port = self.mqtt_port;
            mqtt.username = self.mqtt_user.filter(|u| !u.is_empty());
            mqtt.password = self.mqtt_password;
            mqtt.client_id = self.mqtt_id;
            mqtt
        });

        Config {
            format,
            input,
            output,
            mqtt,
            debug: self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("nfcuid").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.format, FormatOptions::default());
        assert_eq!(
            config.input,
            InputMode::Reader {
                device: DeviceSelection::Prompt
            }
        );
        assert_eq!(config.output, OutputTarget::Keyboard);
        assert_eq!(config.mqtt, None);
        assert!(!config.debug);
    }

    #[test]
    fn test_format_flags() {
        let config = parse(&[
            "--end-char",
            "newline",
            "--in-char",
            "colon",
            "--caps-lock",
            "--reverse",
            "--decimal",
            "--getasdecimal",
        ]);
        assert_eq!(
            config.format,
            FormatOptions::default()
                .with_end_char(CharFlag::NewLine)
                .with_in_char(CharFlag::Colon)
                .with_caps_lock(true)
                .with_reverse(true)
                .with_decimal(true)
                .with_get_as_decimal(true)
        );
    }

    #[rstest]
    #[case("--mqtt-in")]
    #[case("--mqtt-activated")]
    fn test_mqtt_input(#[case] flag: &str) {
        let config = parse(&[flag, "--mqtt-server", "tcp://broker.local", "--mqtt-port", "1884"]);
        assert_eq!(
            config.input,
            InputMode::Mqtt {
                topic: "nfcuid/reader".to_string()
            }
        );

        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.host(), "broker.local");
        assert_eq!(mqtt.port, 1884);
        assert_eq!(mqtt.client_id, "nfcuidclient");
    }

    #[test]
    fn test_mqtt_output() {
        let config = parse(&[
            "--mqtt-out",
            "--mqtt-server",
            "broker.local",
            "--mqtt-out-topic",
            "door/uid",
            "--mqtt-user",
            "kiosk",
            "--mqtt-password",
            "secret",
        ]);
        assert_eq!(
            config.output,
            OutputTarget::MqttPublish {
                topic: "door/uid".to_string()
            }
        );
        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.username.as_deref(), Some("kiosk"));
        assert_eq!(mqtt.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_tcp_output() {
        let config = parse(&[
            "--tcp-out",
            "--tcp-address",
            "10.0.0.5",
            "--tcp-port",
            "9000",
            "--tcp-timeout-ms",
            "1500",
        ]);
        assert_eq!(
            config.output,
            OutputTarget::Tcp(
                TcpConfig::new("10.0.0.5", 9000).with_timeout(Duration::from_millis(1500))
            )
        );
    }

    #[test]
    fn test_device_flag() {
        let config = parse(&["--device", "2"]);
        assert_eq!(
            config.input,
            InputMode::Reader {
                device: DeviceSelection::Index(2)
            }
        );
    }

    #[rstest]
    #[case(&["--end-char", "pipe"])]
    #[case(&["--device", "-1"])]
    #[case(&["--mqtt-out", "--tcp-out"])]
    #[case(&["--bogus"])]
    fn test_invalid_flags_rejected(#[case] args: &[&str]) {
        let argv = std::iter::once("nfcuid").chain(args.iter().copied());
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
