//! Mock keyboard implementation for testing and development.
//!
//! This module provides a keystroke sink that records what it was asked to
//! type, and can be told to fail, without touching the real input system.

use crate::error::{HardwareError, Result};
use crate::traits::KeyboardDevice;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Recorded {
    typed: Vec<String>,
    failing: bool,
    failures: usize,
}

/// Mock keyboard for testing and development.
///
/// # Examples
///
/// ```
/// use nfcuid_hardware::mock::MockKeyboard;
/// use nfcuid_hardware::traits::KeyboardDevice;
///
/// #[tokio::main]
/// async fn main() -> nfcuid_hardware::Result<()> {
///     let (mut keyboard, handle) = MockKeyboard::new();
///
///     keyboard.type_text("04ABCDEF\n").await?;
///     assert_eq!(handle.typed(), vec!["04ABCDEF\n"]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeyboard {
    recorded: Arc<Mutex<Recorded>>,
}

impl MockKeyboard {
    /// Create a new mock keyboard.
    ///
    /// Returns a tuple of (MockKeyboard, MockKeyboardHandle) where the handle
    /// can be used to inspect typed text and inject failures.
    pub fn new() -> (Self, MockKeyboardHandle) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        (
            Self {
                recorded: Arc::clone(&recorded),
            },
            MockKeyboardHandle { recorded },
        )
    }
}

impl Default for MockKeyboard {
    fn default() -> Self {
        Self::new().0
    }
}

impl KeyboardDevice for MockKeyboard {
    async fn type_text(&mut self, text: &str) -> Result<()> {
        let mut recorded = lock(&self.recorded);
        if recorded.failing {
            recorded.failures += 1;
            return Err(HardwareError::keyboard("mock keyboard unavailable"));
        }
        recorded.typed.push(text.to_string());
        Ok(())
    }
}

/// Handle for inspecting a [`MockKeyboard`].
#[derive(Debug, Clone)]
pub struct MockKeyboardHandle {
    recorded: Arc<Mutex<Recorded>>,
}

impl MockKeyboardHandle {
    /// Everything typed so far, one entry per call.
    pub fn typed(&self) -> Vec<String> {
        lock(&self.recorded).typed.clone()
    }

    /// Make every following `type_text` call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        lock(&self.recorded).failing = failing;
    }

    /// Number of calls that failed.
    pub fn failure_count(&self) -> usize {
        lock(&self.recorded).failures
    }
}

fn lock(recorded: &Mutex<Recorded>) -> MutexGuard<'_, Recorded> {
    recorded.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_keyboard_records_text() {
        let (mut keyboard, handle) = MockKeyboard::new();

        keyboard.type_text("01").await.unwrap();
        keyboard.type_text("02").await.unwrap();

        assert_eq!(handle.typed(), vec!["01", "02"]);
    }

    #[tokio::test]
    async fn test_mock_keyboard_failure() {
        let (mut keyboard, handle) = MockKeyboard::new();
        handle.set_failing(true);

        let result = keyboard.type_text("01").await;
        assert!(matches!(result, Err(HardwareError::Keyboard { .. })));
        assert_eq!(handle.failure_count(), 1);
        assert!(handle.typed().is_empty());

        handle.set_failing(false);
        keyboard.type_text("02").await.unwrap();
        assert_eq!(handle.typed(), vec!["02"]);
    }
}
