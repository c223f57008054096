//! Constants used throughout the core crate.

/// Number of records the history keeps when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Storage key under which the history envelope is persisted.
pub const HISTORY_STORAGE_KEY: &str = "rda_history";

/// Format version written into the persisted history envelope.
pub const HISTORY_FORMAT_VERSION: u32 = 1;

/// Longest conversation (in characters) accepted for analysis by default.
pub const DEFAULT_MAX_PROTOCOL_LENGTH: usize = 15_000;

/// Score at or above which a record is reported as toxic.
pub const DEFAULT_TOXICITY_THRESHOLD: u8 = 70;

/// Default directory for persisted data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "rda_data";
