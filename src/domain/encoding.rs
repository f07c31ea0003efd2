//! Hex and exact-length SCALE helpers used at the wire boundary.

use parity_scale_codec::Decode;

use super::error::CodecError;

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string, with or without the `0x` prefix.
pub fn from_hex(value: &str) -> Result<Vec<u8>, CodecError> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    Ok(hex::decode(trimmed)?)
}

/// Decode a fixed 32-byte value from hex.
pub fn from_hex_32(value: &str) -> Result<[u8; 32], CodecError> {
    let bytes = from_hex(value)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        CodecError::Hex(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Decode `T` and require that the whole buffer was consumed.
pub fn decode_exact<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut input = bytes;
    let value = T::decode(&mut input)?;
    if !input.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: input.len(),
        });
    }
    Ok(value)
}

/// Serde adapter that renders `Vec<u8>` as a `0x` hex string.
pub mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_accepts_optional_prefix() {
        assert_eq!(from_hex("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(from_hex("0102").unwrap(), vec![1, 2]);
        assert!(from_hex("0xzz").is_err());
    }

    #[test]
    fn test_from_hex_32_rejects_wrong_length() {
        assert!(from_hex_32("0x01").is_err());
        assert_eq!(from_hex_32(&to_hex(&[7u8; 32])).unwrap(), [7u8; 32]);
    }

    #[test]
    fn test_decode_exact_reports_trailing_bytes() {
        let err = decode_exact::<u8>(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CodecError::TrailingBytes { remaining: 2 }));
        assert_eq!(decode_exact::<u16>(&[1, 0]).unwrap(), 1);
    }
}
