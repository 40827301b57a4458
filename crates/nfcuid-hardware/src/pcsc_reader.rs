//! PC/SC reader backend.
//!
//! Talks to the platform smart card resource manager (pcsc-lite on Linux,
//! WinSCard on Windows, CryptoTokenKit on macOS) through the `pcsc` crate.
//! The status-change call blocks a whole thread, so it runs on the Tokio
//! blocking pool and is interrupted through [`ReaderContext::cancel`].

use crate::error::{HardwareError, Result};
use crate::traits::{CardConnection, ReaderContext};
use crate::types::{ReaderState, ReaderStatus};
use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE, Protocols, Scope, ShareMode, State};
use std::ffi::CString;
use tracing::{debug, warn};

/// PC/SC resource manager context.
#[derive(Clone)]
pub struct PcscContext {
    ctx: Context,
}

impl std::fmt::Debug for PcscContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscContext").finish_non_exhaustive()
    }
}

impl PcscContext {
    /// Establish a user-scope context with the resource manager.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::NoContext` if the PC/SC service is
    /// not running or not installed.
    pub fn establish() -> Result<Self> {
        let ctx = Context::establish(Scope::User)
            .map_err(|e| HardwareError::no_context(e.to_string()))?;
        debug!("PC/SC context established");
        Ok(Self { ctx })
    }
}

impl ReaderContext for PcscContext {
    type Card = PcscCard;

    async fn list_readers(&self) -> Result<Vec<String>> {
        match self.ctx.list_readers_owned() {
            Ok(names) => Ok(names
                .into_iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect()),
            Err(pcsc::Error::NoReadersAvailable) => Ok(Vec::new()),
            Err(e) => Err(map_error(e)),
        }
    }

    async fn get_status_change(&self, states: &mut [ReaderState]) -> Result<()> {
        let request = states
            .iter()
            .map(|state| {
                CString::new(state.name.as_str())
                    .map(|name| (name, state.current))
                    .map_err(|_| HardwareError::invalid_reader("reader name contains NUL"))
            })
            .collect::<Result<Vec<_>>>()?;

        let ctx = self.ctx.clone();
        let events = tokio::task::spawn_blocking(move || {
            let mut raw: Vec<pcsc::ReaderState> = request
                .into_iter()
                .map(|(name, current)| pcsc::ReaderState::new(name, to_pcsc(current)))
                .collect();
            ctx.get_status_change(None, &mut raw)?;
            Ok::<_, pcsc::Error>(
                raw.iter()
                    .map(|r| from_pcsc(r.event_state()))
                    .collect::<Vec<_>>(),
            )
        })
        .await
        .map_err(|e| HardwareError::pcsc(format!("status task failed: {e}")))?
        .map_err(map_error)?;

        for (state, event) in states.iter_mut().zip(events) {
            state.event = event;
        }
        Ok(())
    }

    async fn connect(&self, reader: &str) -> Result<PcscCard> {
        let name = CString::new(reader)
            .map_err(|_| HardwareError::invalid_reader("reader name contains NUL"))?;
        let card = self
            .ctx
            .connect(&name, ShareMode::Shared, Protocols::ANY)
            .map_err(|e| HardwareError::card(format!("connect to {reader}: {e}")))?;
        Ok(PcscCard { card })
    }

    fn cancel(&self) -> Result<()> {
        self.ctx.cancel().map_err(map_error)
    }
}

/// Shared-mode connection to a card.
pub struct PcscCard {
    card: Card,
}

impl CardConnection for PcscCard {
    async fn transmit(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        let mut buffer = [0u8; MAX_BUFFER_SIZE];
        let response = self
            .card
            .transmit(apdu, &mut buffer)
            .map_err(|e| HardwareError::card(format!("transmit: {e}")))?;
        Ok(response.to_vec())
    }

    async fn disconnect(self) -> Result<()> {
        self.card
            .disconnect(Disposition::ResetCard)
            .map_err(|(_card, e)| {
                warn!("Card disconnect failed: {}", e);
                HardwareError::card(format!("disconnect: {e}"))
            })
    }
}

// Every bit is kept: the resource manager compares `current` against the
// full event state, so a dropped INUSE or MUTE reads as a change on each call.
fn to_pcsc(status: ReaderStatus) -> State {
    State::from_bits_retain(status.bits() as _)
}

fn from_pcsc(state: State) -> ReaderStatus {
    ReaderStatus::from_bits_retain(state.bits() as u32)
}

fn map_error(error: pcsc::Error) -> HardwareError {
    match error {
        pcsc::Error::Cancelled => HardwareError::Cancelled,
        pcsc::Error::ReaderUnavailable | pcsc::Error::UnknownReader => {
            HardwareError::reader_gone(error.to_string())
        }
        other => HardwareError::pcsc(other.to_string()),
    }
}
