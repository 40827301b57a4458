//! Output dispatch.
//!
//! Every formatted UID leaves through exactly one [`OutputSink`], chosen at
//! startup. Delivery failures are logged and reported as
//! [`DispatchOutcome::Failed`]; they never stop the service.

use nfcuid_hardware::{AnyKeyboard, KeyboardDevice};
use nfcuid_network::{MqttPublisher, TcpSink};
use tracing::{debug, info, warn};

/// Destination of formatted UIDs.
#[derive(Debug)]
pub enum OutputSink {
    Keyboard(AnyKeyboard),
    MqttPublish(MqttPublisher),
    Tcp(TcpSink),
}

impl OutputSink {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Keyboard(_) => "keyboard",
            Self::MqttPublish(_) => "mqtt",
            Self::Tcp(_) => "tcp",
        }
    }
}

/// Result of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Failed,
}

/// Sends formatted UIDs to the configured sink.
#[derive(Debug)]
pub struct OutputDispatcher {
    sink: OutputSink,
}

impl OutputDispatcher {
    pub fn new(sink: OutputSink) -> Self {
        debug!(sink = sink.kind(), "Output dispatcher ready");
        Self { sink }
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Deliver `text`. Never fails the caller.
    pub async fn dispatch(&mut self, text: &str) -> DispatchOutcome {
        match &mut self.sink {
            OutputSink::Keyboard(keyboard) => {
                debug!(keyboard = keyboard.kind(), "Writing as keyboard input");
                match keyboard.type_text(text).await {
                    Ok(()) => {
                        debug!("Keyboard output written");
                        DispatchOutcome::Delivered
                    }
                    Err(e) => {
                        warn!("Could not write keyboard output: {}", e);
                        DispatchOutcome::Failed
                    }
                }
            }
            OutputSink::MqttPublish(publisher) => match publisher.publish(text) {
                Ok(()) => {
                    debug!(topic = publisher.topic(), "Published output");
                    DispatchOutcome::Delivered
                }
                Err(e) => {
                    warn!("{}", e);
                    DispatchOutcome::Failed
                }
            },
            OutputSink::Tcp(sink) => match sink.send(text).await {
                Ok(attempts) => {
                    info!(peer = %sink.peer(), attempts, "TCP socket closing...");
                    DispatchOutcome::Delivered
                }
                Err(e) => {
                    warn!(peer = %sink.peer(), "{}", e);
                    DispatchOutcome::Failed
                }
            },
        }
    }
}
