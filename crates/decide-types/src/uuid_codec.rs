//! Conversion between textual UUIDs and their two BSON binary encodings.
//!
//! A UUID is 128 bits, split into a most-significant and a least-significant
//! 8-byte half. Two binary layouts exist in the `decide` database:
//!
//! | Encoding   | BSON subtype      | Byte order within each half |
//! |------------|-------------------|-----------------------------|
//! | `Standard` | `0x04` (`Uuid`)   | big-endian (natural)        |
//! | `Legacy`   | `0x03` (`UuidOld`)| reversed                    |
//!
//! The legacy layout is what the JVM driver writes for `java.util.UUID`,
//! so documents read back by the JVM controllers must use it. Both layouts
//! denote the same logical UUID; the codec never alters UUID semantics.

use bson::Binary;
use bson::spec::BinarySubtype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex digits in an unadorned UUID.
const HEX_DIGITS: usize = 32;

/// Number of bytes in each half of a UUID.
const HALF_LEN: usize = 8;

/// Errors produced by the UUID codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input is not 32 hex digits once braces and hyphens are removed.
    #[error("invalid UUID format: {input:?}")]
    InvalidUuidFormat {
        /// The rejected input, as received.
        input: String,
    },

    /// A binary value does not hold a UUID in the expected encoding.
    #[error("invalid UUID binary: subtype {subtype:?}, {len} bytes")]
    InvalidUuidBinary {
        /// Subtype found on the binary value.
        subtype: BinarySubtype,
        /// Payload length found on the binary value.
        len: usize,
    },
}

/// Binary layout used when storing a UUID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UuidEncoding {
    /// Byte-reversed halves, BSON subtype 3. Readable by the JVM driver.
    #[default]
    Legacy,
    /// Natural byte order, BSON subtype 4.
    Standard,
}

impl UuidEncoding {
    /// BSON subtype tagging values in this encoding.
    pub const fn subtype(self) -> BinarySubtype {
        match self {
            Self::Legacy => BinarySubtype::UuidOld,
            Self::Standard => BinarySubtype::Uuid,
        }
    }

    /// Encode a textual UUID in this layout.
    pub fn encode(self, input: &str) -> Result<Binary, CodecError> {
        match self {
            Self::Legacy => encode_legacy(input),
            Self::Standard => encode_standard(input),
        }
    }

    /// Decode a binary value written in this layout.
    pub fn decode(self, binary: &Binary) -> Result<Uuid, CodecError> {
        match self {
            Self::Legacy => decode_legacy(binary),
            Self::Standard => decode_standard(binary),
        }
    }
}

impl core::fmt::Display for UuidEncoding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Standard => f.write_str("standard"),
        }
    }
}

/// Parse a loosely formatted UUID string.
///
/// Braces and hyphens are stripped wherever they appear; what remains must
/// be exactly 32 hex digits in any letter case.
pub fn parse_uuid(input: &str) -> Result<Uuid, CodecError> {
    let hex: String = input
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '-'))
        .collect();

    if hex.len() != HEX_DIGITS || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid_format(input));
    }

    Uuid::try_parse(&hex).map_err(|_parse_err| invalid_format(input))
}

/// Canonical lowercase hyphenated form of a UUID string.
pub fn normalize(input: &str) -> Result<String, CodecError> {
    parse_uuid(input).map(|uuid| uuid.hyphenated().to_string())
}

/// Reverse the byte order within each 8-byte half.
///
/// Applying this twice yields the input unchanged.
pub fn swap_halves(bytes: [u8; 16]) -> [u8; 16] {
    let mut out = bytes;
    let (msb, lsb) = out.split_at_mut(HALF_LEN);
    msb.reverse();
    lsb.reverse();
    out
}

/// Encode a UUID string in the legacy byte-swapped layout (subtype 3).
pub fn encode_legacy(input: &str) -> Result<Binary, CodecError> {
    let uuid = parse_uuid(input)?;
    Ok(Binary {
        subtype: BinarySubtype::UuidOld,
        bytes: swap_halves(*uuid.as_bytes()).to_vec(),
    })
}

/// Encode a UUID string in the standard layout (subtype 4).
pub fn encode_standard(input: &str) -> Result<Binary, CodecError> {
    let uuid = parse_uuid(input)?;
    Ok(Binary {
        subtype: BinarySubtype::Uuid,
        bytes: uuid.as_bytes().to_vec(),
    })
}

/// Decode a legacy byte-swapped UUID binary.
pub fn decode_legacy(binary: &Binary) -> Result<Uuid, CodecError> {
    let bytes = uuid_payload(binary, BinarySubtype::UuidOld)?;
    Ok(Uuid::from_bytes(swap_halves(bytes)))
}

/// Decode a standard UUID binary.
pub fn decode_standard(binary: &Binary) -> Result<Uuid, CodecError> {
    uuid_payload(binary, BinarySubtype::Uuid).map(Uuid::from_bytes)
}

fn uuid_payload(binary: &Binary, expected: BinarySubtype) -> Result<[u8; 16], CodecError> {
    let invalid = || CodecError::InvalidUuidBinary {
        subtype: binary.subtype,
        len: binary.bytes.len(),
    };
    if binary.subtype != expected {
        return Err(invalid());
    }
    <[u8; 16]>::try_from(binary.bytes.as_slice()).map_err(|_len_err| invalid())
}

fn invalid_format(input: &str) -> CodecError {
    CodecError::InvalidUuidFormat {
        input: input.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn legacy_reverses_each_half() {
        let binary = encode_legacy(SAMPLE).unwrap();
        assert_eq!(binary.subtype, BinarySubtype::UuidOld);
        assert_eq!(
            binary.bytes,
            vec![
                0xd4, 0x41, 0x9b, 0xe2, 0x00, 0x84, 0x0e, 0x55, // msb reversed
                0x00, 0x00, 0x44, 0x55, 0x66, 0x44, 0x16, 0xa7, // lsb reversed
            ]
        );
    }

    #[test]
    fn standard_keeps_natural_order() {
        let binary = encode_standard(SAMPLE).unwrap();
        assert_eq!(binary.subtype, BinarySubtype::Uuid);
        assert_eq!(
            binary.bytes,
            vec![
                0x55, 0x0e, 0x84, 0x00, 0xe2, 0x9b, 0x41, 0xd4, 0xa7, 0x16, 0x44, 0x66, 0x55,
                0x44, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn decode_restores_normalized_uuid() {
        let inputs = [
            SAMPLE,
            "550E8400-E29B-41D4-A716-446655440000",
            "{550e8400-e29b-41d4-a716-446655440000}",
            "550e8400e29b41d4a716446655440000",
            "{550E8400e29b41D4A716446655440000}",
        ];
        for input in inputs {
            for encoding in [UuidEncoding::Legacy, UuidEncoding::Standard] {
                let binary = encoding.encode(input).unwrap();
                let decoded = encoding.decode(&binary).unwrap();
                assert_eq!(decoded.hyphenated().to_string(), normalize(input).unwrap());
                assert_eq!(decoded.hyphenated().to_string(), SAMPLE);
            }
        }
    }

    #[test]
    fn swap_is_an_involution() {
        for _ in 0..32 {
            let bytes = *Uuid::new_v4().as_bytes();
            assert_eq!(swap_halves(swap_halves(bytes)), bytes);
        }
        let legacy = encode_legacy(SAMPLE).unwrap();
        let arr = <[u8; 16]>::try_from(legacy.bytes.as_slice()).unwrap();
        assert_eq!(swap_halves(swap_halves(arr)), arr);
    }

    #[test]
    fn malformed_input_is_rejected() {
        let bad = [
            "",
            "not-a-uuid",
            "550e8400-e29b-41d4-a716-44665544000",
            "550e8400-e29b-41d4-a716-4466554400000",
            "550e8400-e29b-41d4-a716-44665544000g",
            "550e8400 e29b 41d4 a716 446655440000",
        ];
        for input in bad {
            assert_eq!(
                encode_legacy(input),
                Err(CodecError::InvalidUuidFormat {
                    input: input.to_owned()
                }),
                "{input:?} should be rejected"
            );
            assert!(encode_standard(input).is_err());
        }
    }

    #[test]
    fn decode_rejects_wrong_subtype_or_length() {
        let standard = encode_standard(SAMPLE).unwrap();
        assert!(matches!(
            decode_legacy(&standard),
            Err(CodecError::InvalidUuidBinary {
                subtype: BinarySubtype::Uuid,
                len: 16
            })
        ));

        let short = Binary {
            subtype: BinarySubtype::UuidOld,
            bytes: vec![0; 15],
        };
        assert!(decode_legacy(&short).is_err());
    }

    #[test]
    fn encoding_deserializes_from_config_names() {
        let legacy: UuidEncoding = serde_json::from_str("\"legacy\"").unwrap();
        let standard: UuidEncoding = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(legacy, UuidEncoding::Legacy);
        assert_eq!(standard, UuidEncoding::Standard);
        assert_eq!(UuidEncoding::default(), UuidEncoding::Legacy);
    }
}
