//! Bytering - bounded lock-free ring buffer for variable-length byte records
//!
//! An in-process single-producer, multi-consumer ring buffer modeled after
//! the LMAX Disruptor. The producer writes length-prefixed records into a
//! fixed byte arena carved into power-of-two slots; each consumer reads
//! the full stream independently at its own pace.
//!
//! ## Key Features
//!
//! - **Lock-Free Hot Path**: `put` and `get` touch only atomic cursors and
//!   the arena; locks exist solely for handle registration
//! - **Zero-Copy Reads**: contiguous records are returned as borrows of
//!   the arena; only records wrapping the arena end are copied into a
//!   per-consumer scratch buffer
//! - **Back-Pressure Built In**: a producer that would overwrite unread
//!   slots busy-waits until every consumer has passed them; records are
//!   never dropped
//! - **Independent Consumers**: each consumer has its own cursor and sees
//!   the identical record stream in FIFO order
//! - **Cache-Friendly**: every cursor is padded to its own cache line to
//!   prevent false sharing
//!
//! ## Example Usage
//!
//! ```rust
//! use bytering::RingBuffer;
//!
//! let ring = RingBuffer::new(64, 1024)?;
//! let mut producer = ring.new_producer()?;
//! let mut consumer = ring.new_consumer()?;
//!
//! producer.put(b"hello")?;
//! assert_eq!(consumer.get()?, b"hello");
//! # Ok::<(), bytering::RingError>(())
//! ```
//!
//! `Consumer::get` busy-waits until a record is available, so consumers
//! are normally driven from their own threads. Handles are `Send`; a
//! single handle must not be shared between threads (its operations take
//! `&mut self`).

pub mod constants;
pub mod error;
pub mod ring;
pub mod sequence;

// Re-export main components
pub use error::{ Result, RingError };
pub use ring::{ Consumer, Producer, RingBuffer, RingBufferConfig };
pub use sequence::{ Sequence, Sequencer, SequencerKind, WaitStrategy, WaitStrategyType };

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
