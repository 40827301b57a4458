//! Mock smart card reader for testing and development.
//!
//! The mock replays a script: a queue of reader state snapshots consumed by
//! the status-change call and a queue of card responses consumed by
//! `transmit`. It behaves like a PC/SC resource manager in one important
//! respect: a status-change call only returns once a snapshot differs from
//! the caller's current state, so re-reporting a transition is a bug the
//! tests can see.

use crate::error::{HardwareError, Result};
use crate::traits::{CardConnection, ReaderContext};
use crate::types::{ReaderState, ReaderStatus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted answer to one `transmit` call.
#[derive(Debug, Clone)]
enum ScriptedResponse {
    Bytes(Vec<u8>),
    Error(String),
}

#[derive(Debug, Default)]
struct Script {
    snapshots: VecDeque<Vec<ReaderStatus>>,
    responses: VecDeque<ScriptedResponse>,
    connect_failures: VecDeque<String>,
    block_when_idle: bool,

    status_calls: Vec<Vec<ReaderStatus>>,
    transmitted: Vec<Vec<u8>>,
    connects: usize,
    disconnects: usize,
    cancels: usize,
}

#[derive(Debug)]
struct Shared {
    readers: Vec<String>,
    script: Mutex<Script>,
}

impl Shared {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Mock reader context.
///
/// # Examples
///
/// ```
/// use nfcuid_hardware::mock::MockReader;
/// use nfcuid_hardware::traits::{CardConnection, ReaderContext};
/// use nfcuid_hardware::ReaderStatus;
///
/// #[tokio::main]
/// async fn main() -> nfcuid_hardware::Result<()> {
///     let (reader, handle) = MockReader::new(vec!["Reader 0".to_string()]);
///     handle.push_status(ReaderStatus::PRESENT);
///     handle.push_response(vec![0x04, 0xAB, 0x90, 0x00]);
///
///     let mut card = reader.connect("Reader 0").await?;
///     let response = card.transmit(&[0xFF, 0xCA, 0x00, 0x00, 0x00]).await?;
///     assert_eq!(response, vec![0x04, 0xAB, 0x90, 0x00]);
///     card.disconnect().await?;
///
///     assert_eq!(handle.open_connections(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockReader {
    shared: Arc<Shared>,
}

impl MockReader {
    /// Create a mock context exposing `readers`.
    ///
    /// Returns the context and a handle used to script it and inspect what
    /// the code under test did.
    pub fn new(readers: Vec<String>) -> (Self, MockReaderHandle) {
        let shared = Arc::new(Shared {
            readers,
            script: Mutex::new(Script::default()),
        });

        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockReaderHandle { shared },
        )
    }
}

impl ReaderContext for MockReader {
    type Card = MockCard;

    async fn list_readers(&self) -> Result<Vec<String>> {
        Ok(self.shared.readers.clone())
    }

    async fn get_status_change(&self, states: &mut [ReaderState]) -> Result<()> {
        let block = {
            let mut script = self.shared.script();
            script
                .status_calls
                .push(states.iter().map(|s| s.current).collect());

            loop {
                let Some(snapshot) = script.snapshots.pop_front() else {
                    break script.block_when_idle;
                };

                let observed: Vec<ReaderStatus> = states
                    .iter()
                    .map(|state| self.status_for(&snapshot, state))
                    .collect();

                let changed = states
                    .iter()
                    .zip(&observed)
                    .any(|(state, status)| state.current.settled() != *status);

                if changed {
                    for (state, status) in states.iter_mut().zip(observed) {
                        state.event = if state.current.settled() != status {
                            status | ReaderStatus::CHANGED
                        } else {
                            status
                        };
                    }
                    return Ok(());
                }
            }
        };

        if block {
            std::future::pending::<()>().await;
        }

        let name = states.first().map(|s| s.name.clone()).unwrap_or_default();
        Err(HardwareError::reader_gone(name))
    }

    async fn connect(&self, reader: &str) -> Result<MockCard> {
        let mut script = self.shared.script();
        if let Some(message) = script.connect_failures.pop_front() {
            return Err(HardwareError::card(message));
        }
        if !self.shared.readers.iter().any(|r| r == reader) {
            return Err(HardwareError::reader_gone(reader));
        }
        script.connects += 1;

        Ok(MockCard {
            shared: Arc::clone(&self.shared),
        })
    }

    fn cancel(&self) -> Result<()> {
        self.shared.script().cancels += 1;
        Ok(())
    }
}

impl MockReader {
    fn status_for(&self, snapshot: &[ReaderStatus], state: &ReaderState) -> ReaderStatus {
        self.shared
            .readers
            .iter()
            .position(|r| *r == state.name)
            .and_then(|i| snapshot.get(i).copied())
            .unwrap_or(state.current.settled())
    }
}

/// Connection to the scripted card.
#[derive(Debug)]
pub struct MockCard {
    shared: Arc<Shared>,
}

impl CardConnection for MockCard {
    async fn transmit(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        let mut script = self.shared.script();
        script.transmitted.push(apdu.to_vec());

        match script.responses.pop_front() {
            Some(ScriptedResponse::Bytes(bytes)) => Ok(bytes),
            Some(ScriptedResponse::Error(message)) => Err(HardwareError::card(message)),
            None => Err(HardwareError::card("no scripted response")),
        }
    }

    async fn disconnect(self) -> Result<()> {
        self.shared.script().disconnects += 1;
        Ok(())
    }
}

/// Handle for scripting a [`MockReader`] and inspecting its use.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    shared: Arc<Shared>,
}

impl MockReaderHandle {
    /// Queue one snapshot holding a status per reader, in reader order.
    pub fn push_snapshot(&self, statuses: Vec<ReaderStatus>) {
        self.shared.script().snapshots.push_back(statuses);
    }

    /// Queue the same status for every reader.
    pub fn push_status(&self, status: ReaderStatus) {
        let count = self.shared.readers.len();
        self.push_snapshot(vec![status; count]);
    }

    /// Queue a response returned by the next `transmit`.
    pub fn push_response(&self, response: Vec<u8>) {
        self.shared
            .script()
            .responses
            .push_back(ScriptedResponse::Bytes(response));
    }

    /// Make the next `transmit` fail.
    pub fn push_transmit_error(&self, message: impl Into<String>) {
        self.shared
            .script()
            .responses
            .push_back(ScriptedResponse::Error(message.into()));
    }

    /// Make the next `connect` fail.
    pub fn fail_next_connect(&self, message: impl Into<String>) {
        self.shared
            .script()
            .connect_failures
            .push_back(message.into());
    }

    /// When the snapshot queue runs dry, block instead of reporting the
    /// reader as unplugged.
    pub fn block_when_idle(&self, block: bool) {
        self.shared.script().block_when_idle = block;
    }

    /// Current states passed to each status-change call, in call order.
    pub fn status_calls(&self) -> Vec<Vec<ReaderStatus>> {
        self.shared.script().status_calls.clone()
    }

    /// Snapshots not consumed yet.
    pub fn pending_snapshots(&self) -> usize {
        self.shared.script().snapshots.len()
    }

    /// APDUs sent to the card, in order.
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.shared.script().transmitted.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.shared.script().connects
    }

    pub fn disconnect_count(&self) -> usize {
        self.shared.script().disconnects
    }

    /// Connections opened and not yet released.
    pub fn open_connections(&self) -> usize {
        let script = self.shared.script();
        script.connects - script.disconnects
    }

    pub fn cancel_count(&self) -> usize {
        self.shared.script().cancels
    }
}
