//! Constants shared by the acquisition pipeline.
//!
//! Card commands, status words and the defaults the command line falls back
//! to. Everything that talks to the reader or to a transport takes its magic
//! numbers from here.
//!
//! # Usage
//!
//! ```
//! use nfcuid_core::constants::*;
//!
//! assert_eq!(GET_DATA_UID_APDU.len(), 5);
//! assert_eq!(STATUS_SUCCESS, [0x90, 0x00]);
//! ```

// ============================================================================
// Card commands
// ============================================================================

/// PC/SC pseudo-APDU "GET DATA" asking the reader for the card UID.
///
/// `CLA=FF INS=CA P1=00 P2=00 Le=00`. The response is the UID followed by a
/// two byte status word.
pub const GET_DATA_UID_APDU: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Status word reported by the card when a command completed normally.
pub const STATUS_SUCCESS: [u8; 2] = [0x90, 0x00];

/// Length of the trailing status word in every card response.
pub const STATUS_WORD_LEN: usize = 2;

// ============================================================================
// Formatting
// ============================================================================

/// Minimum width of the zero-padded decimal rendering of a UID.
pub const DECIMAL_MIN_WIDTH: usize = 10;

/// Separator between hex segments of an inbound MQTT payload.
pub const PAYLOAD_SEGMENT_SEPARATOR: char = ':';

// ============================================================================
// MQTT defaults
// ============================================================================

/// Default broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default topic used for UID input.
pub const DEFAULT_MQTT_TOPIC: &str = "nfcuid/reader";

/// Default topic used for UID output.
pub const DEFAULT_MQTT_OUT_TOPIC: &str = "nfcuid/output";

/// Default MQTT client identifier.
pub const DEFAULT_MQTT_CLIENT_ID: &str = "nfcuidclient";

/// Default MQTT keep-alive interval in seconds.
pub const DEFAULT_MQTT_KEEP_ALIVE_SECS: u64 = 30;

/// Grace period granted to the broker connection on shutdown, in milliseconds.
pub const MQTT_DISCONNECT_GRACE_MS: u64 = 250;

/// Time a signalled process gets to wind down before it is forced to exit,
/// in milliseconds.
pub const SHUTDOWN_GRACE_MS: u64 = 2_000;

// ============================================================================
// TCP sink
// ============================================================================

/// Total number of delivery attempts made by the TCP sink.
pub const TCP_SEND_ATTEMPTS: u32 = 4;

/// Reply a TCP peer sends to acknowledge a UID.
pub const TCP_ACK_REPLY: &str = "OK";
