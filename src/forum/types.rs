//! Forum-specific identifier and classification types.
//!
//! This module contains the types shared across the forum data model:
//! - `QuestionId` / `UserId`: 12-byte document identifiers
//! - `Difficulty`: closed classification attached to a question

use crate::error::{Result, VeriGeekError};
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of raw bytes in a document identifier.
pub const ID_BYTES: usize = 12;

/// Returns the current time in milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generates a fresh identifier: 4 big-endian bytes of Unix seconds followed
/// by 8 random bytes, so identifiers sort roughly by creation time.
fn generate_id_bytes() -> [u8; ID_BYTES] {
    let mut bytes = [0u8; ID_BYTES];
    let secs = (current_timestamp_millis() / 1000) as u32;
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    rand::thread_rng().fill_bytes(&mut bytes[4..]);
    bytes
}

/// Parses a 24-character hex string into raw identifier bytes.
fn parse_id_hex(hex_str: &str, what: &str) -> Result<[u8; ID_BYTES]> {
    let decoded = hex::decode(hex_str)
        .map_err(|_| VeriGeekError::validation(format!("Invalid {} id: not hex", what)))?;

    let bytes: [u8; ID_BYTES] = decoded.try_into().map_err(|_| {
        VeriGeekError::validation(format!(
            "Invalid {} id: expected {} hex characters",
            what,
            ID_BYTES * 2
        ))
    })?;

    Ok(bytes)
}

/// Unique identifier for a question document.
///
/// Generated once at creation and immutable thereafter. Serializes as a
/// 24-character hex string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId([u8; ID_BYTES]);

impl QuestionId {
    /// Generates a new unique question identifier.
    pub fn generate() -> Self {
        Self(generate_id_bytes())
    }

    /// Parses an identifier from its hex representation.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        parse_id_hex(hex_str, "question").map(Self)
    }

    /// Returns the identifier as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for QuestionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(de::Error::custom)
    }
}

/// Reference to a user account.
///
/// Same 12-byte shape as [`QuestionId`]; serializes as hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId([u8; ID_BYTES]);

impl UserId {
    /// Generates a new unique user identifier.
    pub fn generate() -> Self {
        Self(generate_id_bytes())
    }

    /// Parses an identifier from its hex representation.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        parse_id_hex(hex_str, "user").map(Self)
    }

    /// Returns the identifier as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(de::Error::custom)
    }
}

/// Difficulty classification for a question.
///
/// A closed enumeration: the difficulty endpoint rejects anything outside
/// these three levels instead of storing free-form text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = VeriGeekError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(VeriGeekError::validation(format!(
                "Unknown difficulty level: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_hex_round_trip() {
        let id = QuestionId::generate();
        let hex = id.to_hex();
        assert_eq!(hex.len(), ID_BYTES * 2);
        assert_eq!(QuestionId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn test_question_id_rejects_bad_hex() {
        assert!(QuestionId::from_hex("not hex at all").is_err());
        assert!(QuestionId::from_hex("abcd").is_err());
        // 26 chars, too long
        assert!(QuestionId::from_hex("00000000000000000000000000").is_err());
    }

    #[test]
    fn test_all_zero_id_parses() {
        // The canonical "nonexistent" id used by clients probing for 404s.
        let id = QuestionId::from_hex("000000000000000000000000").unwrap();
        assert_eq!(id.to_hex(), "000000000000000000000000");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!(
            "beginner".parse::<Difficulty>().unwrap(),
            Difficulty::Beginner
        );
        assert_eq!(
            "  Advanced ".parse::<Difficulty>().unwrap(),
            Difficulty::Advanced
        );
        assert!("expert".parse::<Difficulty>().is_err());
        assert!("".parse::<Difficulty>().is_err());
    }
}
