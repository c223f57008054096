//! Canonical identifiers and their generators.

use crate::{UuidError, UuidResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// RDA's canonical identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed the contained UUID is valid, and its string form is always canonical, so
/// identifiers compare and persist consistently whether they were generated locally or parsed
/// from a request.
///
/// # Construction
/// - [`Identifier::new`] generates a new random identifier.
/// - [`Identifier::parse`] validates an externally supplied identifier.
/// - [`Identifier::from_u128`] builds a deterministic identifier (used by
///   [`SequentialIdGenerator`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Uuid);

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Identifier {
    /// Generates a new random identifier (RFC 4122 version 4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds an identifier from a raw 128-bit value.
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are not normalised.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "identifier must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid identifier '{}': {}", input, e)))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes of `0-9` / `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for Identifier {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Identifier::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Source of fresh, unique identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Identifier;
}

/// Random v4 identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> Identifier {
        Identifier::new()
    }
}

/// Deterministic identifiers `…0001`, `…0002`, … for tests and reproducible fixtures.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Identifier {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Identifier::from_u128(u128::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_canonical_identifier() {
        let id = Identifier::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(Identifier::is_canonical(&canonical));
    }

    #[test]
    fn parse_round_trips_canonical_form() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id = Identifier::parse(canonical).unwrap();
        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn parse_rejects_hyphenated_identifier() {
        let result = Identifier::parse("550e8400-e29b-41d4-a716-446655440000");
        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn parse_rejects_uppercase_and_short_input() {
        assert!(Identifier::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(Identifier::parse("550e8400").is_err());
        assert!(Identifier::parse("").is_err());
    }

    #[test]
    fn sequential_generator_is_deterministic() {
        let generator = SequentialIdGenerator::new();
        assert_eq!(
            generator.next_id().to_string(),
            "00000000000000000000000000000001"
        );
        assert_eq!(
            generator.next_id().to_string(),
            "00000000000000000000000000000002"
        );

        let other = SequentialIdGenerator::starting_at(255);
        assert_eq!(other.next_id().to_string(), "000000000000000000000000000000ff");
    }

    #[test]
    fn uuid_generator_yields_distinct_identifiers() {
        let generator = UuidGenerator;
        assert_ne!(generator.next_id(), generator.next_id());
    }

    #[test]
    fn identifier_serialises_as_canonical_string() {
        let id = Identifier::from_u128(10);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0000000000000000000000000000000a\"");

        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<Identifier, _> = serde_json::from_str("\"not-an-id\"");
        assert!(bad.is_err());
    }
}
