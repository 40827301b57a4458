//! Hardware abstraction layer for nfcuid.
//!
//! This crate provides trait-based abstractions for the two devices the
//! acquisition pipeline drives: a smart card reader and a keyboard. Mock
//! implementations stand in for both in tests; the real backends are behind
//! cargo features because they link against platform libraries.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Blocking where the platform blocks**: the PC/SC status-change call
//!   runs on the Tokio blocking pool and has no timeout; waits end through a
//!   `CancellationToken`.
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//!
//! # Reader Monitoring
//!
//! [`ReaderMonitor`] waits for a card to arrive and to leave:
//!
//! ```no_run
//! use nfcuid_hardware::{ReaderMonitor, Result};
//! use nfcuid_hardware::traits::ReaderContext;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn wait_for_tap<C: ReaderContext>(ctx: &C, reader: String) -> Result<()> {
//!     let readers = vec![reader];
//!     let monitor = ReaderMonitor::new(ctx, CancellationToken::new());
//!     let index = monitor.wait_for_present(&readers).await?;
//!     monitor.wait_for_release(&readers, index).await
//! }
//! ```
//!
//! # Features
//!
//! - `hardware-pcsc`: [`PcscContext`](pcsc_reader::PcscContext), a PC/SC
//!   reader backend.
//! - `keyboard-enigo`: [`EnigoKeyboard`](keyboard::EnigoKeyboard), a
//!   keystroke injector.

pub mod devices;
pub mod error;
pub mod keyboard;
pub mod mock;
pub mod monitor;
#[cfg(feature = "hardware-pcsc")]
pub mod pcsc_reader;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyKeyboard;
pub use error::{HardwareError, Result};
pub use keyboard::ConsoleKeyboard;
pub use monitor::ReaderMonitor;
pub use traits::{CardConnection, KeyboardDevice, ReaderContext};
pub use types::{ReaderState, ReaderStatus};

#[cfg(feature = "hardware-pcsc")]
pub use pcsc_reader::{PcscCard, PcscContext};
