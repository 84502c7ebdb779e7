//! Slot-addressed byte storage with length-prefixed records
//!
//! The arena is a single allocation of `slot_size * slot_count` bytes. A
//! record written at sequence `s` starts at byte `(s & slot_mask) *
//! slot_size`: a little-endian `u16` length prefix, then the payload,
//! wrapping to offset 0 when it runs past the arena end. A record longer
//! than one slot spills into the following slots; only its first slot
//! carries a prefix. Slot starts are slot-aligned, so the prefix itself
//! never wraps.
//!
//! The arena performs no synchronization of its own. Mutual exclusion
//! between the producer and the consumers is algorithmic: the sequencer
//! protocol guarantees a byte range has exactly one writer until every
//! reader has passed it.

use std::cell::UnsafeCell;
use std::ptr;
use std::slice;

use crate::constants::{ MAX_DATA_SIZE, SLOT_OVERHEAD };
use crate::error::{ Result, RingError };

pub(crate) struct ByteArena {
    buffer: UnsafeCell<Box<[u8]>>,
    slot_size: usize,
    slot_count: usize,
    slot_mask: i64,
    buffer_size: usize,
}

// SAFETY: The arena is shared between one producer and any number of
// consumers. All writes go through `put` under a producer reservation,
// and the sequencer protocol orders them before any read of the same
// range: a consumer only reads bytes after its acquire load of the
// producer cursor observes the release-store commit covering them, and
// the producer only rewrites bytes after every consumer cursor has passed
// them. No byte is ever written and read concurrently.
unsafe impl Send for ByteArena {}
unsafe impl Sync for ByteArena {}

impl ByteArena {
    /// `slot_size` is the padded slot size, data capacity plus
    /// [`SLOT_OVERHEAD`]; the ring buffer constructor validates the
    /// user-facing values before padding.
    pub(crate) fn new(slot_size: usize, slot_count: usize) -> Self {
        Self {
            buffer: UnsafeCell::new(vec![0u8; slot_size * slot_count].into_boxed_slice()),
            slot_size,
            slot_count,
            slot_mask: slot_count as i64 - 1,
            buffer_size: slot_size * slot_count,
        }
    }

    /// Padded slot size in bytes.
    pub(crate) fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Number of slots in the arena.
    pub(crate) fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of slots a payload of `size` bytes occupies, prefix
    /// included. An empty payload still occupies one slot.
    pub(crate) fn slots_needed(&self, size: usize) -> Result<usize> {
        if size > MAX_DATA_SIZE {
            return Err(RingError::DataTooLarge(size));
        }
        if size == 0 {
            return Ok(1);
        }

        let needed = (size + SLOT_OVERHEAD + self.slot_size - 1) / self.slot_size;
        if needed > self.slot_count {
            return Err(RingError::DataExceedsCapacity {
                size,
                needed,
                capacity: self.slot_count,
            });
        }

        Ok(needed)
    }

    /// Copy `data` into the arena starting at the slot addressed by `seq`,
    /// wrapping past the arena end if needed.
    ///
    /// The caller must hold a reservation covering every slot the record
    /// touches.
    pub(crate) fn put(&self, data: &[u8], seq: i64) {
        let mut index = (seq & self.slot_mask) as usize * self.slot_size;
        let prefix = (data.len() as u16).to_le_bytes();

        // SAFETY: The reservation covering `seq` gives this producer
        // exclusive access to the record's byte range (see the Send/Sync
        // note above), and every offset below is bounded by buffer_size.
        unsafe {
            let buf = (*self.buffer.get()).as_mut_ptr();

            ptr::copy_nonoverlapping(prefix.as_ptr(), buf.add(index), SLOT_OVERHEAD);
            index += SLOT_OVERHEAD;

            let head = data.len().min(self.buffer_size - index);
            ptr::copy_nonoverlapping(data.as_ptr(), buf.add(index), head);
            if head < data.len() {
                // Remainder wraps to the front of the arena.
                ptr::copy_nonoverlapping(data.as_ptr().add(head), buf, data.len() - head);
            }
        }
    }

    /// Read the record at `seq`.
    ///
    /// A record stored contiguously is returned as a zero-copy borrow of
    /// the arena. A record that wraps past the arena end is assembled
    /// into `scratch` (grown only when the record exceeds its current
    /// size) and returned as a borrow of it.
    ///
    /// # Errors
    ///
    /// [`RingError::DataTooLarge`] if the decoded length prefix exceeds
    /// the maximum record size; under a correct single producer this only
    /// happens when the prefix bytes are corrupt.
    pub(crate) fn get<'a>(&'a self, seq: i64, scratch: &'a mut Vec<u8>) -> Result<&'a [u8]> {
        let mut index = (seq & self.slot_mask) as usize * self.slot_size;

        let n = self.read_prefix(index) as usize;
        if n > MAX_DATA_SIZE {
            return Err(RingError::DataTooLarge(n));
        }
        index += SLOT_OVERHEAD;

        // SAFETY: The caller's reservation means the producer committed
        // this record with a release store already observed by the
        // caller's acquire load, and the bytes stay unwritten until the
        // caller's cursor passes them.
        unsafe {
            let buf = (*self.buffer.get()).as_ptr();

            if index + n < self.buffer_size {
                return Ok(slice::from_raw_parts(buf.add(index), n));
            }

            if scratch.len() < n {
                scratch.resize(n, 0);
            }
            let head = self.buffer_size - index;
            ptr::copy_nonoverlapping(buf.add(index), scratch.as_mut_ptr(), head);
            ptr::copy_nonoverlapping(buf, scratch.as_mut_ptr().add(head), n - head);
            Ok(&scratch[..n])
        }
    }

    /// Length prefix of the record at `seq`.
    pub(crate) fn next_data_size(&self, seq: i64) -> u16 {
        self.read_prefix((seq & self.slot_mask) as usize * self.slot_size)
    }

    fn read_prefix(&self, index: usize) -> u16 {
        // SAFETY: `index` is a slot start, so both prefix bytes are in
        // bounds; prefixes are only read for committed sequences.
        unsafe {
            let buf = (*self.buffer.get()).as_ptr();
            u16::from_le_bytes([*buf.add(index), *buf.add(index + 1)])
        }
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<u8> {
        // SAFETY: test-only, never called with a concurrent writer.
        unsafe { (*self.buffer.get()).to_vec() }
    }
}
