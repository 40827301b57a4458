//! Fatal errors of the `nfcuid` binary and their exit codes.

use nfcuid_hardware::HardwareError;
use nfcuid_network::MqttError;
use nfcuid_service::ServiceError;
use thiserror::Error;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] nfcuid_core::Error),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Mqtt(#[from] MqttError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Device prompt failed: {0}")]
    Prompt(String),

    #[error("Interrupted")]
    Interrupted,
}

impl CliError {
    /// Every fatal condition, a shutdown signal included, exits with 1.
    pub fn exit_code(&self) -> i32 {
        exit_code::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        assert_eq!(CliError::Interrupted.exit_code(), 1);
        assert_eq!(CliError::from(nfcuid_core::Error::NoDevices).exit_code(), 1);
    }

    #[test]
    fn test_no_devices_message() {
        assert_eq!(
            CliError::from(nfcuid_core::Error::NoDevices).to_string(),
            "Devices not found. Try to plug-in new device and restart"
        );
    }
}
