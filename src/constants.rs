//! Layout and protocol constants used throughout the library.

/// Number of overhead bytes at the start of a record's first slot,
/// holding the record's length prefix (little-endian u16).
pub const SLOT_OVERHEAD: usize = 2;

/// Minimum per-slot data capacity a caller may configure.
pub const MIN_SLOT_SIZE: usize = SLOT_OVERHEAD;

/// Maximum record payload size in bytes. The length prefix is a u16, and
/// two of its encodable bytes are reserved for the prefix itself.
pub const MAX_DATA_SIZE: usize = 64 * 1024 - SLOT_OVERHEAD;

/// Maximum number of slots a buffer may be configured with.
pub const MAX_DATA_SLOTS: usize = MAX_DATA_SIZE / MIN_SLOT_SIZE;

/// Number of producers a single ring buffer admits.
pub const MAX_PRODUCER_COUNT: usize = 1;

/// Initial value of every cursor: nothing published or consumed yet.
/// The first publishable sequence is 0.
pub const INITIAL_SEQUENCE_VALUE: i64 = -1;

/// Cache line size for padding sequence counters (64 bytes on most
/// modern CPUs).
pub const CACHE_LINE_SIZE: usize = 64;

/// Validate that all constants are consistently configured
pub fn validate_constants() -> Result<(), &'static str> {
    if MIN_SLOT_SIZE < SLOT_OVERHEAD {
        return Err("MIN_SLOT_SIZE must cover the length prefix");
    }
    if MAX_DATA_SIZE + SLOT_OVERHEAD != 64 * 1024 {
        return Err("MAX_DATA_SIZE must leave room for the length prefix");
    }
    if u16::try_from(MAX_DATA_SIZE).is_err() {
        return Err("MAX_DATA_SIZE must fit in the u16 length prefix");
    }
    if !CACHE_LINE_SIZE.is_power_of_two() {
        return Err("CACHE_LINE_SIZE must be a power of 2");
    }
    Ok(())
}
