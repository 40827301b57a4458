//! Hardware capability trait definitions.
//!
//! These traits are the contract between the acquisition pipeline and the
//! devices it drives: a smart card reader context, a connection to the card
//! in the reader, and a keystroke injector. Mock and real implementations
//! are interchangeable behind them.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::ReaderState;

/// Smart card reader context.
///
/// Owns the connection to the reader subsystem (PC/SC resource manager or a
/// mock) and hands out card connections.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`, which is an opaque type that cannot be used in trait objects.
/// Use generic type parameters:
///
/// ```no_run
/// use nfcuid_hardware::traits::ReaderContext;
/// use nfcuid_hardware::error::Result;
///
/// async fn first_reader<C: ReaderContext>(ctx: &C) -> Result<Option<String>> {
///     Ok(ctx.list_readers().await?.into_iter().next())
/// }
/// ```
pub trait ReaderContext: Send + Sync {
    /// Connection type returned by [`connect`](Self::connect).
    type Card: CardConnection;

    /// List the names of the readers currently attached.
    ///
    /// An empty list is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader subsystem cannot be queried.
    async fn list_readers(&self) -> Result<Vec<String>>;

    /// Block until the state of at least one reader differs from its
    /// `current` state, then fill in every `event` state.
    ///
    /// There is no timeout. The call returns early only through
    /// [`cancel`](Self::cancel).
    ///
    /// # Errors
    ///
    /// Returns an error if a reader was unplugged, the context became
    /// invalid, or the wait was cancelled.
    async fn get_status_change(&self, states: &mut [ReaderState]) -> Result<()>;

    /// Open a shared-mode connection to the card in `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no card or the reader refuses the
    /// connection.
    async fn connect(&self, reader: &str) -> Result<Self::Card>;

    /// Ask a pending [`get_status_change`](Self::get_status_change) to return.
    ///
    /// # Errors
    ///
    /// Returns an error if the cancel request could not be delivered.
    fn cancel(&self) -> Result<()> {
        Ok(())
    }
}

/// Connection to the card currently in a reader.
pub trait CardConnection: Send {
    /// Send a command APDU and return the full response, status word
    /// included.
    ///
    /// # Errors
    ///
    /// Returns an error if the card was removed or the transmission failed.
    async fn transmit(&mut self, apdu: &[u8]) -> Result<Vec<u8>>;

    /// Release the connection and reset the card.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader rejected the disconnect. The
    /// connection is gone either way.
    async fn disconnect(self) -> Result<()>;
}

/// Keystroke injection.
///
/// Types text into whatever window has focus. Failures are reported to the
/// caller, who decides whether they matter.
pub trait KeyboardDevice: Send {
    /// Type `text` as if entered on a keyboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform input facility is unavailable.
    async fn type_text(&mut self, text: &str) -> Result<()>;
}
