//! UID acquisition service.
//!
//! Connects the pieces of the other crates into the two ways nfcuid runs:
//! reading card taps from a PC/SC reader, or taking UID payloads from an
//! MQTT topic. Either way every UID is formatted with the run's
//! [`FormatOptions`](nfcuid_core::FormatOptions) and handed to a single
//! [`OutputDispatcher`].

pub mod dispatcher;
pub mod error;
pub mod ingest;
pub mod service;
pub mod session;

pub use dispatcher::{DispatchOutcome, OutputDispatcher, OutputSink};
pub use error::{Result, ServiceError};
pub use ingest::MqttIngestLoop;
pub use service::{Service, reader_at};
pub use session::{CardSession, TapOutcome};
