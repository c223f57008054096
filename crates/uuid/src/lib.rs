//! Identifier and clock collaborators.
//!
//! Every analysis record and every detected pattern receives an identifier, and every record
//! receives a creation timestamp. Generating those inline makes assembly non-deterministic, so
//! this crate provides them as injectable collaborators:
//!
//! - [`Identifier`]: RDA's canonical identifier, **32 lowercase hexadecimal characters** (no
//!   hyphens), the same text you get from `Uuid::new_v4().simple().to_string()`.
//! - [`IdGenerator`]: source of fresh identifiers. [`UuidGenerator`] for production,
//!   [`SequentialIdGenerator`] for tests.
//! - [`Clock`]: source of timestamps. [`SystemClock`] and [`MonotonicClock`] for production,
//!   [`FixedClock`] for tests.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (CLI arguments, REST path segments) must already be
//! canonical; [`Identifier::parse`] rejects uppercase, hyphenated or otherwise malformed input.

mod clock;
mod identifier;

pub use clock::{Clock, FixedClock, MonotonicClock, SystemClock};
pub use identifier::{IdGenerator, Identifier, SequentialIdGenerator, Uuid, UuidGenerator};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
