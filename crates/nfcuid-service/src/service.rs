//! Top-level service.
//!
//! Owns the run configuration and the output dispatcher and runs one of the
//! two input modes until cancellation or a fatal error.

use crate::dispatcher::OutputDispatcher;
use crate::error::Result;
use crate::ingest::MqttIngestLoop;
use crate::session::CardSession;
use nfcuid_core::{Config, Error};
use nfcuid_hardware::ReaderContext;
use nfcuid_network::InboundMessage;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Resolve a 1-based device number against the reader list.
///
/// # Errors
///
/// Returns `Error::NoDevices` for an empty list and
/// `Error::DeviceOutOfRange` for 0 or a number past the end.
pub fn reader_at(readers: &[String], device: usize) -> nfcuid_core::Result<&str> {
    if readers.is_empty() {
        return Err(Error::NoDevices);
    }

    device
        .checked_sub(1)
        .and_then(|i| readers.get(i))
        .map(String::as_str)
        .ok_or(Error::DeviceOutOfRange {
            requested: device,
            available: readers.len(),
        })
}

pub struct Service {
    config: Config,
    dispatcher: OutputDispatcher,
}

impl Service {
    pub fn new(config: Config, dispatcher: OutputDispatcher) -> Self {
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &OutputDispatcher {
        &self.dispatcher
    }

    /// Read cards from `reader` until cancelled.
    ///
    /// # Errors
    ///
    /// Returns the first fatal reader error.
    pub async fn run_reader<C: ReaderContext>(
        &mut self,
        ctx: &C,
        reader: &str,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!(reader, "Starting card session");
        CardSession::new(
            ctx,
            reader,
            self.config.format,
            &mut self.dispatcher,
            cancel,
        )
        .run()
        .await
    }

    /// Dispatch MQTT payloads until the queue closes or the token fires.
    ///
    /// # Errors
    ///
    /// Never fails once the subscription is up; the `Result` keeps both
    /// modes interchangeable for the caller.
    pub async fn run_mqtt(
        &mut self,
        inbound: UnboundedReceiver<InboundMessage>,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!("Starting MQTT ingest");
        MqttIngestLoop::new(
            inbound,
            self.config.format,
            &mut self.dispatcher,
            cancel,
        )
        .run()
        .await;
        Ok(())
    }
}
