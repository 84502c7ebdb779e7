//! Consumer handle: an independent read cursor over the record stream

use std::sync::Arc;

use crate::error::Result;
use crate::ring::arena::ByteArena;
use crate::sequence::Sequencer;

/// An independent read handle over a ring buffer.
///
/// Every consumer observes the complete record stream in publication
/// order, at its own pace; consumers do not coordinate with each other.
/// Obtained from [`RingBuffer::new_consumer`].
///
/// [`RingBuffer::new_consumer`]: crate::RingBuffer::new_consumer
pub struct Consumer {
    arena: Arc<ByteArena>,
    sequencer: Arc<Sequencer>,
    scratch: Vec<u8>,
    pending: Option<i64>,
}

impl Consumer {
    pub(crate) fn new(arena: Arc<ByteArena>, sequencer: Arc<Sequencer>) -> Self {
        Self {
            arena,
            sequencer,
            scratch: Vec::new(),
            pending: None,
        }
    }

    /// Read the next record, busy-waiting until one is published.
    ///
    /// The returned view aliases the arena when the record is stored
    /// contiguously, and this consumer's scratch buffer when the record
    /// wraps past the arena end. Either way it stays valid until the next
    /// call to `get`, which releases the record's slots back to the
    /// producer; the borrow checker enforces that window, since a live
    /// view blocks the next call on this handle.
    ///
    /// A record's slot span is unknown until its length prefix is
    /// visible, so the reservation happens in two steps: one slot to
    /// expose the prefix, then the full span. The intermediate state is
    /// unobservable because a handle is driven by a single thread.
    ///
    /// # Errors
    ///
    /// [`RingError::DataTooLarge`] when the record's length prefix
    /// decodes above the maximum record size, which under a correct
    /// single producer means the arena is corrupt. Views obtained before
    /// an error must not be relied on afterwards; the next successful
    /// `get` may reuse or grow the scratch buffer.
    ///
    /// [`RingError::DataTooLarge`]: crate::RingError::DataTooLarge
    pub fn get(&mut self) -> Result<&[u8]> {
        // Release the previous record only now, once its view is dead.
        // Committing before returning would let the producer overwrite
        // bytes a live view still aliases.
        if let Some(seq) = self.pending.take() {
            self.sequencer.commit(seq);
        }

        let head = self.sequencer.request(1)?;
        let size = self.arena.next_data_size(head) as usize;
        let needed = self.arena.slots_needed(size)?;

        let tail = self.sequencer.request(needed)?;

        let view = self.arena.get(tail - needed as i64 + 1, &mut self.scratch)?;
        self.pending = Some(tail);

        Ok(view)
    }

    /// Sequence of the last slot this consumer has released back to the
    /// producer, or -1 before the first release.
    pub fn cursor(&self) -> i64 {
        self.sequencer.get()
    }
}
