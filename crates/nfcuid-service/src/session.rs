//! Card session.
//!
//! One tap on the selected reader goes through:
//!
//! ```text
//! wait present ─> connect ─> GET DATA ─┬─ 90 00 ──> format ─> dispatch ─> disconnect ─> wait release
//!      ^                               └─ other ──> disconnect ──────────────────────────────┐
//!      └─────────────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reader failures are fatal and returned to the caller. A response that is
//! too short or carries a non-success status word only restarts the cycle.
//! The card connection is released on every path.

use crate::dispatcher::OutputDispatcher;
use crate::error::Result;
use nfcuid_core::constants::{GET_DATA_UID_APDU, STATUS_SUCCESS, STATUS_WORD_LEN};
use nfcuid_core::{FormatOptions, format_uid};
use nfcuid_hardware::{CardConnection, HardwareError, ReaderContext, ReaderMonitor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What one tap produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// The UID was read, formatted and handed to the dispatcher.
    Emitted { uid: Vec<u8>, output: String },

    /// Fewer than two bytes came back.
    ShortResponse,

    /// The status word was not `90 00`.
    BadStatus { sw1: u8, sw2: u8 },
}

/// Reads UIDs from one reader until cancelled.
pub struct CardSession<'a, C: ReaderContext> {
    ctx: &'a C,
    monitor: ReaderMonitor<'a, C>,
    readers: Vec<String>,
    format: FormatOptions,
    dispatcher: &'a mut OutputDispatcher,
    cancel: CancellationToken,
}

impl<'a, C: ReaderContext> CardSession<'a, C> {
    pub fn new(
        ctx: &'a C,
        reader: impl Into<String>,
        format: FormatOptions,
        dispatcher: &'a mut OutputDispatcher,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            monitor: ReaderMonitor::new(ctx, cancel.clone()),
            readers: vec![reader.into()],
            format,
            dispatcher,
            cancel,
        }
    }

    fn reader(&self) -> &str {
        &self.readers[0]
    }

    /// Read cards until cancelled.
    ///
    /// After an emitted UID the session waits for the card to be removed
    /// before the next tap; after a rejected response it goes straight back
    /// to waiting for a card.
    ///
    /// # Errors
    ///
    /// Returns the first fatal reader error. Cancellation ends the run with
    /// `Ok(())`.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.run_until_error().await;
        match result {
            Err(e) if e.is_cancelled() => {
                info!(reader = %self.reader(), "Card session stopped");
                Ok(())
            }
            other => other,
        }
    }

    async fn run_until_error(&mut self) -> Result<()> {
        loop {
            if let TapOutcome::Emitted { .. } = self.read_once().await? {
                info!("Waiting for card release...");
                self.monitor.wait_for_release(&self.readers, 0).await?;
                info!("Card released");
            }
        }
    }

    /// Wait for one card, read its UID and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns wait, connect and transmit failures, and
    /// `HardwareError::Cancelled` wrapped in [`ServiceError`] when the
    /// token fired while waiting or while the UID was being delivered.
    ///
    /// [`ServiceError`]: crate::ServiceError
    pub async fn read_once(&mut self) -> Result<TapOutcome> {
        info!("Waiting for a Card");
        self.monitor.wait_for_present(&self.readers).await?;

        info!("Connecting to card...");
        let mut card = self.ctx.connect(self.reader()).await?;

        let response = match card.transmit(&GET_DATA_UID_APDU).await {
            Ok(response) => response,
            Err(e) => {
                release(card).await;
                return Err(e.into());
            }
        };
        debug!(len = response.len(), "Card responded");

        let outcome = match split_response(&response) {
            Err(outcome) => outcome,
            Ok(uid) => {
                info!("UID is: {}", spaced_hex(uid));
                let output = format_uid(uid, &self.format);
                let delivered = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => false,
                    _ = self.dispatcher.dispatch(&output) => true,
                };
                if !delivered {
                    debug!("Dispatch abandoned on cancellation");
                    release(card).await;
                    return Err(HardwareError::Cancelled.into());
                }
                TapOutcome::Emitted {
                    uid: uid.to_vec(),
                    output,
                }
            }
        };

        release(card).await;
        Ok(outcome)
    }
}

/// Separate the UID from the trailing status word.
fn split_response(response: &[u8]) -> std::result::Result<&[u8], TapOutcome> {
    if response.len() < STATUS_WORD_LEN {
        info!("Not enough bytes in answer. Try again");
        return Err(TapOutcome::ShortResponse);
    }

    let (uid, status) = response.split_at(response.len() - STATUS_WORD_LEN);
    if status != STATUS_SUCCESS {
        info!(
            "Operation failed to complete. Error code {:02x} {:02x}",
            status[0], status[1]
        );
        return Err(TapOutcome::BadStatus {
            sw1: status[0],
            sw2: status[1],
        });
    }

    Ok(uid)
}

/// Disconnect with reset; a failure here is only worth a warning.
async fn release<K: CardConnection>(card: K) {
    if let Err(e) = card.disconnect().await {
        warn!("Failed to disconnect card: {}", e);
    }
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], TapOutcome::ShortResponse)]
    #[case(&[0x90], TapOutcome::ShortResponse)]
    #[case(&[0x6A, 0x82], TapOutcome::BadStatus { sw1: 0x6A, sw2: 0x82 })]
    #[case(&[0x04, 0xAB, 0x63, 0x00], TapOutcome::BadStatus { sw1: 0x63, sw2: 0x00 })]
    fn test_rejected_responses(#[case] response: &[u8], #[case] expected: TapOutcome) {
        assert_eq!(split_response(response), Err(expected));
    }

    #[rstest]
    #[case(&[0x90, 0x00], &[])]
    #[case(&[0x04, 0xAB, 0xCD, 0x90, 0x00], &[0x04, 0xAB, 0xCD])]
    fn test_accepted_responses(#[case] response: &[u8], #[case] uid: &[u8]) {
        assert_eq!(split_response(response), Ok(uid));
    }

    #[test]
    fn test_spaced_hex() {
        assert_eq!(spaced_hex(&[0x04, 0xAB, 0x0C]), "04 ab 0c");
        assert_eq!(spaced_hex(&[]), "");
    }
}
