//! Error types for the acquisition service.

use nfcuid_hardware::HardwareError;
use nfcuid_network::MqttError;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Fatal conditions that end a service run.
///
/// Recoverable conditions (bad card responses, failed deliveries,
/// undecodable payload segments) are logged where they happen and never
/// reach this type.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Reader wait, connect or transmit failed.
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Broker connect or subscribe failed.
    #[error(transparent)]
    Mqtt(#[from] MqttError),

    /// Invalid configuration or device selection.
    #[error(transparent)]
    Config(#[from] nfcuid_core::Error),
}

impl ServiceError {
    /// Whether the run ended because its cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Hardware(e) if e.is_cancelled())
    }
}
