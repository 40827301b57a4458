//! Card presence monitoring.
//!
//! [`ReaderMonitor`] turns the blocking status-change call of a
//! [`ReaderContext`] into two waits: "until a card is present" and "until
//! the card is gone". Both keep a per-reader [`ReaderState`] and copy every
//! observed event state into the current state before blocking again, so
//! each call reports the next transition rather than the one just seen.
//!
//! # Examples
//!
//! ```no_run
//! use nfcuid_hardware::ReaderMonitor;
//! use nfcuid_hardware::mock::MockReader;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> nfcuid_hardware::Result<()> {
//! let (reader, _handle) = MockReader::new(vec!["Reader 0".to_string()]);
//! let monitor = ReaderMonitor::new(&reader, CancellationToken::new());
//!
//! let readers = vec!["Reader 0".to_string()];
//! let index = monitor.wait_for_present(&readers).await?;
//! monitor.wait_for_release(&readers, index).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{HardwareError, Result};
use crate::traits::ReaderContext;
use crate::types::{ReaderState, ReaderStatus};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Presence/absence waits over a reader context.
pub struct ReaderMonitor<'a, C: ReaderContext> {
    ctx: &'a C,
    cancel: CancellationToken,
}

impl<'a, C: ReaderContext> ReaderMonitor<'a, C> {
    pub fn new(ctx: &'a C, cancel: CancellationToken) -> Self {
        Self { ctx, cancel }
    }

    /// Wait until one of `readers` holds a card and return its index.
    ///
    /// Readers are scanned in order, so the lowest index wins when several
    /// report a card in the same round. Blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Returns the status-change error unchanged, or
    /// `HardwareError::Cancelled` if the monitor's token fired.
    pub async fn wait_for_present(&self, readers: &[String]) -> Result<usize> {
        let mut states: Vec<ReaderState> = readers
            .iter()
            .map(|name| ReaderState::new(name.clone(), ReaderStatus::UNAWARE))
            .collect();

        loop {
            for (index, state) in states.iter_mut().enumerate() {
                if state.is_present() {
                    trace!(reader = %state.name, index, "Card present");
                    return Ok(index);
                }
                state.sync_current();
            }
            self.status_change(&mut states).await?;
        }
    }

    /// Wait until the card in `readers[index]` has been removed.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidReader` if `index` is out of range,
    /// otherwise as [`wait_for_present`](Self::wait_for_present).
    pub async fn wait_for_release(&self, readers: &[String], index: usize) -> Result<()> {
        let name = readers.get(index).ok_or_else(|| {
            HardwareError::invalid_reader(format!(
                "Reader index {index} out of range ({} readers)",
                readers.len()
            ))
        })?;

        // The card was just read, so start from "present" and wait for the
        // next transition.
        let mut states = vec![ReaderState {
            name: name.clone(),
            current: ReaderStatus::PRESENT,
            event: ReaderStatus::PRESENT,
        }];

        loop {
            if states[0].is_empty() {
                trace!(reader = %name, "Card released");
                return Ok(());
            }
            states[0].sync_current();
            self.status_change(&mut states).await?;
        }
    }

    async fn status_change(&self, states: &mut [ReaderState]) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                if let Err(e) = self.ctx.cancel() {
                    warn!("Failed to cancel pending status change: {}", e);
                }
                Err(HardwareError::Cancelled)
            }
            result = self.ctx.get_status_change(states) => result,
        }
    }
}
