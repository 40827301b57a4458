//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod keyboard;
pub mod reader;

// Re-export commonly used types
pub use keyboard::{MockKeyboard, MockKeyboardHandle};
pub use reader::{MockCard, MockReader, MockReaderHandle};
