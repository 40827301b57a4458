//! Keystroke injection backends.
//!
//! [`ConsoleKeyboard`] writes the text to standard output and is what debug
//! runs and builds without keystroke support use. [`EnigoKeyboard`] types
//! into the focused window and needs the `keyboard-enigo` feature.

use crate::error::{HardwareError, Result};
use crate::traits::KeyboardDevice;
use tokio::io::AsyncWriteExt;
use tracing::trace;

/// Prints text instead of typing it.
#[derive(Debug, Default)]
pub struct ConsoleKeyboard {
    _private: (),
}

impl ConsoleKeyboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyboardDevice for ConsoleKeyboard {
    async fn type_text(&mut self, text: &str) -> Result<()> {
        trace!(len = text.len(), "Writing output to console");
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("OUTPUT: {text}\n").as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Types text through the platform input facility.
///
/// A fresh `Enigo` is opened on a blocking thread for every call, so the
/// device itself is `Send` whatever the platform backend is.
#[cfg(feature = "keyboard-enigo")]
#[derive(Debug, Default)]
pub struct EnigoKeyboard {
    _private: (),
}

#[cfg(feature = "keyboard-enigo")]
impl EnigoKeyboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "keyboard-enigo")]
impl KeyboardDevice for EnigoKeyboard {
    async fn type_text(&mut self, text: &str) -> Result<()> {
        use enigo::{Enigo, Keyboard, Settings};

        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut enigo = Enigo::new(&Settings::default())
                .map_err(|e| HardwareError::keyboard(e.to_string()))?;
            enigo
                .text(&text)
                .map_err(|e| HardwareError::keyboard(e.to_string()))
        })
        .await
        .map_err(|e| HardwareError::keyboard(format!("keyboard task failed: {e}")))?
    }
}

/// Fallback used when keystroke support was not compiled in.
#[cfg_attr(feature = "keyboard-enigo", allow(dead_code))]
pub(crate) fn keystrokes_unavailable() -> HardwareError {
    HardwareError::unsupported("keystroke injection (build with --features keyboard-enigo)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_keyboard_writes() {
        let mut keyboard = ConsoleKeyboard::new();
        assert!(keyboard.type_text("04abcdef").await.is_ok());
    }

    #[test]
    fn test_unavailable_error_names_feature() {
        assert!(keystrokes_unavailable().to_string().contains("keyboard-enigo"));
    }
}
