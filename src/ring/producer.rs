//! Producer handle: the write side of a ring buffer

use std::sync::Arc;

use crate::error::Result;
use crate::ring::arena::ByteArena;
use crate::sequence::Sequencer;

/// The single write handle of a ring buffer.
///
/// Obtained from [`RingBuffer::new_producer`]; at most one exists per
/// buffer. The handle is `Send` but not shareable between threads: `put`
/// takes `&mut self`, so one thread drives it at a time.
///
/// [`RingBuffer::new_producer`]: crate::RingBuffer::new_producer
pub struct Producer {
    arena: Arc<ByteArena>,
    sequencer: Arc<Sequencer>,
}

impl Producer {
    pub(crate) fn new(arena: Arc<ByteArena>, sequencer: Arc<Sequencer>) -> Self {
        Self { arena, sequencer }
    }

    /// Append one record to the stream and return the number of slots it
    /// consumed.
    ///
    /// Busy-waits while the buffer is full, that is until every consumer
    /// has passed the slots this record would overwrite. The record is
    /// visible to consumers once `put` returns.
    ///
    /// # Errors
    ///
    /// [`RingError::DataTooLarge`] when the payload exceeds the maximum
    /// record size, [`RingError::DataExceedsCapacity`] when it would need
    /// more slots than the buffer has. Nothing is written in either case.
    ///
    /// [`RingError::DataTooLarge`]: crate::RingError::DataTooLarge
    /// [`RingError::DataExceedsCapacity`]: crate::RingError::DataExceedsCapacity
    pub fn put(&mut self, data: &[u8]) -> Result<usize> {
        let needed = self.arena.slots_needed(data.len())?;

        let seq = self.sequencer.request(needed)?;
        self.arena.put(data, seq - needed as i64 + 1);
        self.sequencer.commit(seq);

        Ok(needed)
    }

    /// Sequence of the last committed slot, or -1 before the first `put`.
    pub fn cursor(&self) -> i64 {
        self.sequencer.get()
    }
}
