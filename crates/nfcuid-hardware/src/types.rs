//! Reader state types shared by the monitor and the reader backends.
//!
//! [`ReaderStatus`] mirrors the PC/SC `SCARD_STATE_*` flags with the same bit
//! values. Bits without a name here (the event counter in the high word) are
//! retained as well, so an observed state can be handed back to the resource
//! manager unchanged.

use bitflags::bitflags;

bitflags! {
    /// State of a reader slot as reported by the status-change call.
    ///
    /// The empty set is "unaware": the caller has no idea what state the
    /// reader is in and wants to be told immediately.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReaderStatus: u32 {
        const IGNORE      = 0x0001;
        /// The reported state differs from the caller's current state.
        const CHANGED     = 0x0002;
        const UNKNOWN     = 0x0004;
        const UNAVAILABLE = 0x0008;
        /// No card in the field.
        const EMPTY       = 0x0010;
        /// A card is in the field.
        const PRESENT     = 0x0020;
        const ATRMATCH    = 0x0040;
        const EXCLUSIVE   = 0x0080;
        /// Another application holds the card in shared mode.
        const INUSE       = 0x0100;
        /// The card does not answer to reset.
        const MUTE        = 0x0200;
        const UNPOWERED   = 0x0400;
    }
}

impl ReaderStatus {
    /// Caller does not know the reader state yet.
    pub const UNAWARE: Self = Self::empty();

    /// Same status with the `CHANGED` marker dropped, for comparisons.
    pub fn settled(self) -> Self {
        self.difference(Self::CHANGED)
    }
}

/// Per-reader record passed to the status-change call.
///
/// `current` is what the caller believes; the call blocks until the reader
/// state differs from it and then fills in `event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderState {
    pub name: String,
    pub current: ReaderStatus,
    pub event: ReaderStatus,
}

impl ReaderState {
    /// Create a state record with nothing observed yet.
    pub fn new(name: impl Into<String>, current: ReaderStatus) -> Self {
        Self {
            name: name.into(),
            current,
            event: ReaderStatus::UNAWARE,
        }
    }

    /// Adopt the last observed state as the current one, so the next call
    /// waits for the next transition instead of re-reporting this one.
    pub fn sync_current(&mut self) {
        self.current = self.event.settled();
    }

    pub fn is_present(&self) -> bool {
        self.event.contains(ReaderStatus::PRESENT)
    }

    pub fn is_empty(&self) -> bool {
        self.event.contains(ReaderStatus::EMPTY)
    }
}
