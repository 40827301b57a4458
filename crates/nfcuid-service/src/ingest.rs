//! MQTT ingest loop.
//!
//! Takes UID payloads received on the input topic, decodes them and sends
//! them through the same formatting and dispatch path as a card tap.

use crate::dispatcher::{DispatchOutcome, OutputDispatcher};
use nfcuid_core::{FormatOptions, decode_payload, format_uid};
use nfcuid_network::InboundMessage;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Consumes inbound messages in arrival order.
pub struct MqttIngestLoop<'a> {
    inbound: UnboundedReceiver<InboundMessage>,
    format: FormatOptions,
    dispatcher: &'a mut OutputDispatcher,
    cancel: CancellationToken,
}

impl<'a> MqttIngestLoop<'a> {
    pub fn new(
        inbound: UnboundedReceiver<InboundMessage>,
        format: FormatOptions,
        dispatcher: &'a mut OutputDispatcher,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inbound,
            format,
            dispatcher,
            cancel,
        }
    }

    /// Process messages until the queue closes or the token fires.
    ///
    /// A delivery still in flight when the token fires is abandoned.
    /// Returns the number of messages dispatched.
    pub async fn run(mut self) -> usize {
        let mut dispatched = 0;
        let cancel = self.cancel.clone();

        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("MQTT ingest cancelled");
                    break;
                }
                message = self.inbound.recv() => message,
            };

            let Some(message) = message else {
                debug!("MQTT inbound queue closed");
                break;
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("MQTT ingest cancelled during dispatch");
                    break;
                }
                outcome = self.handle(&message) => outcome,
            };

            if outcome.is_some() {
                dispatched += 1;
            }
        }

        info!(dispatched, "MQTT ingest stopped");
        dispatched
    }

    /// Decode, format and dispatch one message.
    ///
    /// Returns `None` for an empty payload, which is ignored.
    pub async fn handle(&mut self, message: &InboundMessage) -> Option<DispatchOutcome> {
        trace!(topic = %message.topic, len = message.payload.len(), "Received message");
        if message.payload.is_empty() {
            return None;
        }

        let uid = decode_payload(&message.payload_str());
        debug!("GOT: {}", hex::encode(&uid));

        let output = format_uid(&uid, &self.format);
        Some(self.dispatcher.dispatch(&output).await)
    }
}
