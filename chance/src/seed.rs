use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Derives an integer seed from arbitrary text.
///
/// The text is hashed as UTF-8 and the first four bytes of the digest are read as a
/// little-endian `i32`, so the same text yields the same seed on every platform. This is not a
/// security primitive; collisions are expected and harmless.
pub fn hash_text(text: &str) -> i32 {
    let digest = Sha256::digest(text.as_bytes());
    i32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// A seed as the caller supplied it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSeed {
    Integer(i64),
    Text(String),
}

impl RawSeed {
    /// The integer handed to the generator.
    pub fn to_seed(&self) -> i64 {
        match self {
            RawSeed::Integer(seed) => *seed,
            RawSeed::Text(text) => hash_text(text).into(),
        }
    }

    /// Reads a seed from user input: anything that parses as an integer is an integer seed,
    /// everything else is hashed as text.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse() {
            Ok(seed) => RawSeed::Integer(seed),
            Err(_) => RawSeed::Text(input.into()),
        }
    }
}

impl From<i64> for RawSeed {
    fn from(seed: i64) -> Self {
        RawSeed::Integer(seed)
    }
}

impl From<i32> for RawSeed {
    fn from(seed: i32) -> Self {
        RawSeed::Integer(seed.into())
    }
}

impl From<&str> for RawSeed {
    fn from(text: &str) -> Self {
        RawSeed::Text(text.into())
    }
}

impl From<String> for RawSeed {
    fn from(text: String) -> Self {
        RawSeed::Text(text)
    }
}

impl fmt::Display for RawSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSeed::Integer(seed) => write!(f, "{}", seed),
            RawSeed::Text(text) => write!(f, "{:?}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{hash_text, RawSeed};

    #[test]
    fn hashing_is_stable() {
        assert_eq!(hash_text("goblin cave"), hash_text("goblin cave"));
        assert_ne!(hash_text("goblin cave"), hash_text("goblin cove"));
    }

    #[test]
    fn hash_reads_first_four_bytes_little_endian() {
        // sha256("") begins e3 b0 c4 42
        assert_eq!(hash_text(""), i32::from_le_bytes([0xe3, 0xb0, 0xc4, 0x42]));
    }

    #[test]
    fn integer_seed_is_identity() {
        assert_eq!(RawSeed::Integer(-17).to_seed(), -17);
        assert_eq!(RawSeed::from(i64::MAX).to_seed(), i64::MAX);
    }

    #[test]
    fn text_seed_is_hashed() {
        let seed = RawSeed::from("dungeon-1");
        assert_eq!(seed.to_seed(), i64::from(hash_text("dungeon-1")));
    }

    #[test]
    fn parse_prefers_integers() {
        assert_eq!(RawSeed::parse("42"), RawSeed::Integer(42));
        assert_eq!(RawSeed::parse("-3"), RawSeed::Integer(-3));
        assert_eq!(RawSeed::parse("forty-two"), RawSeed::Text("forty-two".into()));
    }
}
