//! UID to text conversion.
//!
//! [`format_uid`] is total: every byte sequence and every [`FormatOptions`]
//! value produce a string, so callers never have to handle a formatting
//! failure.
//!
//! # Examples
//!
//! ```
//! use nfcuid_core::{CharFlag, FormatOptions, format_uid};
//!
//! let opts = FormatOptions::default()
//!     .with_caps_lock(true)
//!     .with_in_char(CharFlag::Colon);
//! assert_eq!(format_uid(&[0x0A, 0xBC], &opts), "0A:BC");
//!
//! let opts = FormatOptions::default().with_get_as_decimal(true);
//! assert_eq!(format_uid(&[0xDE, 0xAD, 0xBE, 0xEF], &opts), "3735928559");
//! ```

use crate::constants::DECIMAL_MIN_WIDTH;
use crate::types::FormatOptions;

/// Render `raw` according to `opts`.
///
/// With `get_as_decimal` the bytes are read as one big-endian integer and
/// printed in decimal, zero-padded to ten digits. An empty UID yields an
/// empty string in that mode, terminator included.
///
/// Otherwise every byte becomes one token (`%02x`, `%02X` or `%03d`), tokens
/// are joined by `in_char` and `end_char` is appended.
pub fn format_uid(raw: &[u8], opts: &FormatOptions) -> String {
    if opts.get_as_decimal {
        if raw.is_empty() {
            return String::new();
        }
        let mut output = format!("{:0>width$}", to_decimal(raw), width = DECIMAL_MIN_WIDTH);
        output.push_str(opts.end_char.output());
        return output;
    }

    let render = |byte: &u8| {
        if opts.decimal {
            format!("{byte:03}")
        } else if opts.caps_lock {
            format!("{byte:02X}")
        } else {
            format!("{byte:02x}")
        }
    };

    let tokens: Vec<String> = if opts.reverse {
        raw.iter().rev().map(render).collect()
    } else {
        raw.iter().map(render).collect()
    };

    let mut output = tokens.join(opts.in_char.output());
    output.push_str(opts.end_char.output());
    output
}

/// Convert a big-endian byte string to its decimal representation.
///
/// Works on little-endian base-10 digits so UIDs of any length convert
/// without overflow.
fn to_decimal(bytes: &[u8]) -> String {
    let mut digits: Vec<u8> = vec![0];

    for &byte in bytes {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            let value = u32::from(*digit) * 256 + carry;
            *digit = (value % 10) as u8;
            carry = value / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }

    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }

    digits.iter().rev().map(|d| char::from(b'0' + d)).collect()
}
