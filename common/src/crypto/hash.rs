use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

pub const HASH_SIZE: usize = 32; // 32 bytes / 256 bits

/// 32-byte identifier used for asset IDs, swap IDs, ticket IDs,
/// storage keys and content hashes.
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    pub const fn zero() -> Self {
        Hash::new([0; HASH_SIZE])
    }

    pub const fn repeat_byte(byte: u8) -> Self {
        Hash::new([byte; HASH_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; HASH_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// Build a hash from a slice, left padding with zeroes when the
    /// slice is shorter than 32 bytes (big endian alignment).
    pub fn from_slice_padded(slice: &[u8]) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let len = slice.len().min(HASH_SIZE);
        bytes[HASH_SIZE - len..].copy_from_slice(&slice[slice.len() - len..]);
        Hash::new(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Hash {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| "Invalid hash")?;
        Ok(Hash::new(bytes))
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        Hash::from_str(&hex).map_err(SerdeError::custom)
    }
}

impl Encodable for Hash {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

impl Decodable for Hash {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        rlp.decoder().decode_value(|bytes| {
            if bytes.len() != HASH_SIZE {
                return Err(DecoderError::RlpInvalidLength);
            }
            let mut buf = [0u8; HASH_SIZE];
            buf.copy_from_slice(bytes);
            Ok(Hash::new(buf))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let hash = Hash::repeat_byte(0xab);
        let parsed = Hash::from_str(&hash.to_hex()).expect("valid hex");
        assert_eq!(hash, parsed);
    }

    #[test]
    fn test_from_slice_padded() {
        let hash = Hash::from_slice_padded(&[1, 2]);
        assert_eq!(hash.as_bytes()[30], 1);
        assert_eq!(hash.as_bytes()[31], 2);
        assert!(hash.as_bytes()[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_rlp_roundtrip() {
        let hash = Hash::repeat_byte(0x42);
        let encoded = rlp::encode(&hash);
        let decoded: Hash = rlp::decode(&encoded).expect("decodes");
        assert_eq!(hash, decoded);
    }
}
