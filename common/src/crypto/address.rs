use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

pub const ADDRESS_SIZE: usize = 20; // 20 bytes / 160 bits

/// 20-byte account identifier
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub const fn zero() -> Self {
        Address::new([0; ADDRESS_SIZE])
    }

    pub const fn repeat_byte(byte: u8) -> Self {
        Address::new([byte; ADDRESS_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; ADDRESS_SIZE] {
        self.0
    }

    /// Build an address from a slice, keeping the rightmost 20 bytes
    /// (big endian alignment, as for 32-byte padded call words).
    pub fn from_slice_padded(slice: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        let len = slice.len().min(ADDRESS_SIZE);
        bytes[ADDRESS_SIZE - len..].copy_from_slice(&slice[slice.len() - len..]);
        Address::new(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| "Invalid address")?;
        Ok(Address::new(bytes))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        Address::from_str(&hex).map_err(SerdeError::custom)
    }
}

impl Encodable for Address {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

impl Decodable for Address {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        rlp.decoder().decode_value(|bytes| {
            if bytes.len() != ADDRESS_SIZE {
                return Err(DecoderError::RlpInvalidLength);
            }
            let mut buf = [0u8; ADDRESS_SIZE];
            buf.copy_from_slice(bytes);
            Ok(Address::new(buf))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::repeat_byte(0x11);
        let parsed = Address::from_str(&addr.to_hex()).expect("valid hex");
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_rlp_roundtrip() {
        let addr = Address::repeat_byte(0x99);
        let encoded = rlp::encode(&addr);
        let decoded: Address = rlp::decode(&encoded).expect("decodes");
        assert_eq!(addr, decoded);
    }
}
