//! Decoding of UID payloads received over MQTT.
//!
//! Publishers send the UID as colon separated hex, e.g. `04:AB:CD:EF`, or as
//! one hex run (`04ABCDEF`). Segments that are not valid hex are dropped.

use crate::constants::PAYLOAD_SEGMENT_SEPARATOR;

/// Decode an inbound payload into raw UID bytes.
///
/// The payload is trimmed, split on `:` and every segment is hex-decoded.
/// Segments that fail to decode contribute nothing.
///
/// # Examples
///
/// ```
/// use nfcuid_core::decode_payload;
///
/// assert_eq!(decode_payload(" 04:ab:CD "), vec![0x04, 0xab, 0xcd]);
/// assert_eq!(decode_payload("04:zz:05"), vec![0x04, 0x05]);
/// ```
pub fn decode_payload(payload: &str) -> Vec<u8> {
    payload
        .trim()
        .split(PAYLOAD_SEGMENT_SEPARATOR)
        .filter_map(|segment| hex::decode(segment).ok())
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("04:AB:CD:EF", &[0x04, 0xab, 0xcd, 0xef])]
    #[case("04abcdef", &[0x04, 0xab, 0xcd, 0xef])]
    #[case("04ab:cdef", &[0x04, 0xab, 0xcd, 0xef])]
    #[case("  de:ad\n", &[0xde, 0xad])]
    fn test_decode_valid(#[case] payload: &str, #[case] expected: &[u8]) {
        assert_eq!(decode_payload(payload), expected);
    }

    #[rstest]
    #[case("04:xyz:05", &[0x04, 0x05])]
    #[case("abc:01", &[0x01])] // odd length
    #[case("hello", &[])]
    #[case("::", &[])]
    #[case("", &[])]
    fn test_decode_drops_bad_segments(#[case] payload: &str, #[case] expected: &[u8]) {
        assert_eq!(decode_payload(payload), expected);
    }
}
