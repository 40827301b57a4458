//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Rust Edition 2024) is not
//! object-safe, so `Box<dyn KeyboardDevice>` is not an option. The output
//! dispatcher holds an [`AnyKeyboard`] instead and matches on it, which keeps
//! dispatch static and lets backends come and go with cargo features.
//!
//! # Examples
//!
//! ```
//! use nfcuid_hardware::devices::AnyKeyboard;
//! use nfcuid_hardware::mock::MockKeyboard;
//!
//! let (keyboard, _handle) = MockKeyboard::new();
//! let any_keyboard = AnyKeyboard::Mock(keyboard);
//! assert_eq!(any_keyboard.kind(), "mock");
//! ```

use crate::keyboard::ConsoleKeyboard;
#[cfg(feature = "keyboard-enigo")]
use crate::keyboard::EnigoKeyboard;
use crate::mock::MockKeyboard;
use crate::traits::KeyboardDevice;
use crate::Result;

/// Enum wrapper for keyboard device dispatch.
///
/// # Examples
///
/// ```
/// use nfcuid_hardware::devices::AnyKeyboard;
/// use nfcuid_hardware::traits::KeyboardDevice;
/// use nfcuid_hardware::mock::MockKeyboard;
///
/// #[tokio::main]
/// async fn main() -> nfcuid_hardware::Result<()> {
///     let (keyboard, handle) = MockKeyboard::new();
///     let mut any_keyboard = AnyKeyboard::Mock(keyboard);
///
///     any_keyboard.type_text("0A:BC").await?;
///     assert_eq!(handle.typed(), vec!["0A:BC"]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyKeyboard {
    /// Prints to standard output.
    Console(ConsoleKeyboard),

    /// Types into the focused window.
    #[cfg(feature = "keyboard-enigo")]
    Enigo(EnigoKeyboard),

    /// Mock keyboard for development and testing.
    Mock(MockKeyboard),
}

impl AnyKeyboard {
    /// The platform keystroke injector.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unsupported` when the crate was built without
    /// the `keyboard-enigo` feature.
    pub fn system() -> Result<Self> {
        #[cfg(feature = "keyboard-enigo")]
        {
            Ok(Self::Enigo(EnigoKeyboard::new()))
        }
        #[cfg(not(feature = "keyboard-enigo"))]
        {
            Err(crate::keyboard::keystrokes_unavailable())
        }
    }

    /// Short backend name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Console(_) => "console",
            #[cfg(feature = "keyboard-enigo")]
            Self::Enigo(_) => "enigo",
            Self::Mock(_) => "mock",
        }
    }
}

impl KeyboardDevice for AnyKeyboard {
    async fn type_text(&mut self, text: &str) -> Result<()> {
        match self {
            Self::Console(device) => device.type_text(text).await,
            #[cfg(feature = "keyboard-enigo")]
            Self::Enigo(device) => device.type_text(text).await,
            Self::Mock(device) => device.type_text(text).await,
        }
    }
}
