//! Reader and keyboard failures.
//!
//! PC/SC return codes are folded into these variants by the pcsc backend;
//! the mocks raise the same variants so sessions can be tested against
//! either.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The reader was unplugged or the card was removed mid-exchange.
    #[error("Reader unavailable: {reader}")]
    ReaderGone { reader: String },

    /// A blocking wait was cancelled before the reader reported a change.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Not supported: {operation}")]
    Unsupported { operation: String },

    /// The PC/SC service is missing or not running.
    #[error("Failed to establish PC/SC context: {message}")]
    NoContext { message: String },

    #[error("PC/SC error: {message}")]
    Pcsc { message: String },

    /// A reader name PC/SC cannot accept, or an index past the reader list.
    #[error("Invalid reader: {message}")]
    InvalidReader { message: String },

    /// Connect or transmit to the card on the reader failed.
    #[error("Card error: {message}")]
    Card { message: String },

    #[error("Keyboard error: {message}")]
    Keyboard { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn reader_gone(reader: impl Into<String>) -> Self {
        Self::ReaderGone {
            reader: reader.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    pub fn no_context(message: impl Into<String>) -> Self {
        Self::NoContext {
            message: message.into(),
        }
    }

    pub fn pcsc(message: impl Into<String>) -> Self {
        Self::Pcsc {
            message: message.into(),
        }
    }

    pub fn invalid_reader(message: impl Into<String>) -> Self {
        Self::InvalidReader {
            message: message.into(),
        }
    }

    pub fn card(message: impl Into<String>) -> Self {
        Self::Card {
            message: message.into(),
        }
    }

    pub fn keyboard(message: impl Into<String>) -> Self {
        Self::Keyboard {
            message: message.into(),
        }
    }

    /// True for a cancelled wait, which ends a session cleanly.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
