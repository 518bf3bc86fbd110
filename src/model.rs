use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const ADDRESS_LEN: usize = 32;

pub const CATEGORIES: [&str; 5] = ["Geopolitica", "Guerra", "Economia", "Trattati", "Cultura"];

pub const ALL_CATEGORIES: &str = "Tutti";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid base58 address: {0}")]
    Base58(String),
    #[error("address must be {ADDRESS_LEN} bytes, got {0}")]
    Length(usize),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn short(&self) -> String {
        let full = self.to_string();
        if full.len() <= 8 {
            return full;
        }
        format!("{}...{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::Length(decoded.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub address: Address,
    pub bytes: Vec<u8>,
}

impl RawAccount {
    pub fn new(address: Address, bytes: Vec<u8>) -> Self {
        Self { address, bytes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub address: Address,

    pub author: Address,

    pub uploaded_at: i64,

    pub event_at: i64,

    pub topic: String,
    pub description: String,
    pub category: String,

    /// Empty when the publisher gave no source.
    pub source_url: String,
}

impl HistoricalRecord {
    pub fn source_link(&self) -> Option<&str> {
        if self.source_url.is_empty() {
            None
        } else {
            Some(&self.source_url)
        }
    }
}
