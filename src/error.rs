//! Error types for the bytering library
//!
//! All failures are configuration or programming errors detected before a
//! request starts waiting; there is no recoverable runtime error on the
//! hot path. A corrupt length prefix read from the arena surfaces as
//! [`RingError::DataTooLarge`] and is fatal for that consumer.

use thiserror::Error;

use crate::constants::{ MAX_DATA_SIZE, MAX_DATA_SLOTS, MAX_PRODUCER_COUNT, MIN_SLOT_SIZE };

/// Result type alias used throughout the library.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors surfaced by buffer construction, handle registration, and the
/// producer/consumer operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    /// Payload length, or a decoded length prefix, exceeds the maximum
    /// encodable record size.
    #[error("data size {0} exceeds the maximum of {max} bytes", max = MAX_DATA_SIZE)]
    DataTooLarge(usize),

    /// Payload would occupy more slots than the buffer holds.
    #[error("data size {size} needs {needed} slots but the buffer has {capacity}")]
    DataExceedsCapacity {
        size: usize,
        needed: usize,
        capacity: usize,
    },

    /// Configured slot size is below the minimum.
    #[error("slot size {0} is below the minimum of {min} bytes", min = MIN_SLOT_SIZE)]
    SlotTooSmall(usize),

    /// Slot count must be a power of two so slot addressing reduces to a
    /// mask.
    #[error("slot count {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// Configured slot count exceeds the maximum.
    #[error("slot count {0} exceeds the maximum of {max}", max = MAX_DATA_SLOTS)]
    CapacityExceeded(usize),

    /// A second producer was requested from a buffer that already has one.
    #[error("ring buffer admits at most {max} producer(s)", max = MAX_PRODUCER_COUNT)]
    TooManyProducers,

    /// A sequence reservation of zero slots was requested.
    #[error("sequence request count must be at least 1")]
    InvalidArgument,
}
