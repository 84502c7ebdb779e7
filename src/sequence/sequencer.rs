//! Sequence reservation and publication protocol
//!
//! A [`Sequencer`] couples a participant's cursor with the cursors it must
//! not overtake (its *gates*). Reserving slots is a two step protocol:
//! `request` runs an admission test against the gates and busy-waits until
//! it passes, `commit` makes the reserved range visible to everyone gating
//! on this participant. The cursor only moves on `commit`.
//!
//! Producers and consumers run the same protocol with different admission
//! tests:
//!
//! - A producer reserving up to sequence `s` computes the *wrap point*
//!   `s - buffer_size`, the oldest sequence whose slot the reservation
//!   would overwrite. It waits until every gate has consumed that slot.
//! - A consumer simply waits until every gate has published the sequences
//!   it wants to read.
//!
//! Both sides keep a cached snapshot of the gating minimum so the common
//! case skips reading other participants' cache lines entirely.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ Result, RingError };
use crate::sequence::{ Sequence, WaitStrategy };

/// Selects the admission test run inside [`Sequencer::request`].
///
/// The two variants share the whole reserve/commit protocol and differ
/// only in what they must not overtake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerKind {
    /// Gated on consumers: must not overwrite unread slots.
    Producer,
    /// Gated on producers: must not read unpublished slots.
    Consumer,
}

/// A participant's cursor plus its gating relationships.
///
/// The sequencer itself is shared (the ring buffer keeps one handle per
/// participant for registration wiring), but per the single-writer rule
/// only the owning participant calls `request`/`commit`/`next`.
pub struct Sequencer {
    cursor: Arc<Sequence>,
    gates: RwLock<Vec<Arc<Sequence>>>,
    buffer_size: i64,
    kind: SequencerKind,
    wait: Arc<dyn WaitStrategy>,
}

impl Sequencer {
    /// Create a producer sequencer over a buffer of `buffer_size` slots.
    pub fn producer(buffer_size: usize, wait: Arc<dyn WaitStrategy>) -> Result<Self> {
        Self::new(SequencerKind::Producer, buffer_size, wait)
    }

    /// Create a consumer sequencer over a buffer of `buffer_size` slots.
    pub fn consumer(buffer_size: usize, wait: Arc<dyn WaitStrategy>) -> Result<Self> {
        Self::new(SequencerKind::Consumer, buffer_size, wait)
    }

    /// Create a sequencer of the given kind. `buffer_size` must be a
    /// power of two.
    pub fn new(
        kind: SequencerKind,
        buffer_size: usize,
        wait: Arc<dyn WaitStrategy>
    ) -> Result<Self> {
        if buffer_size == 0 || !buffer_size.is_power_of_two() {
            return Err(RingError::NotPowerOfTwo(buffer_size));
        }

        Ok(Self {
            cursor: Arc::new(Sequence::new()),
            gates: RwLock::new(Vec::new()),
            buffer_size: buffer_size as i64,
            kind,
            wait,
        })
    }

    /// The shared cursor handle, for wiring into other sequencers' gates.
    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.cursor
    }

    /// Committed cursor value.
    pub fn get(&self) -> i64 {
        self.cursor.get()
    }

    /// Reserve the next `n` sequence numbers and return the last one, so
    /// the reserved range is `[result - n + 1, result]`.
    ///
    /// Busy-waits (through the configured wait strategy) until the
    /// admission test passes. The cursor does not move until [`commit`].
    ///
    /// # Errors
    ///
    /// [`RingError::InvalidArgument`] if `n` is zero.
    ///
    /// [`commit`]: Sequencer::commit
    pub fn request(&self, n: usize) -> Result<i64> {
        if n == 0 {
            return Err(RingError::InvalidArgument);
        }

        let cursor = self.cursor.get();
        let next_seq = cursor + n as i64;

        match self.kind {
            SequencerKind::Producer => {
                // wrap_point is the oldest sequence whose slot this
                // reservation would reuse; every gate must have passed it.
                let wrap_point = next_seq - self.buffer_size;
                let cached_gate = self.cursor.cached_gate();

                if wrap_point > cached_gate || cached_gate > cursor {
                    // The minimum is seeded with our own cursor: a
                    // producer without gates ends up gated on itself.
                    let mut spins = 0;
                    let mut min_seq = self.min_gate(cursor);
                    while wrap_point > min_seq {
                        self.wait.park(spins);
                        spins += 1;
                        min_seq = self.min_gate(cursor);
                    }
                    self.cursor.set_cached_gate(min_seq);
                }
            }
            SequencerKind::Consumer => {
                if next_seq > self.cursor.cached_gate() {
                    // Seed with MAX so a single gate's value is adopted
                    // verbatim.
                    let mut spins = 0;
                    let mut min_seq = self.min_gate(i64::MAX);
                    while next_seq > min_seq {
                        self.wait.park(spins);
                        spins += 1;
                        min_seq = self.min_gate(i64::MAX);
                    }
                    self.cursor.set_cached_gate(min_seq);
                }
            }
        }

        Ok(next_seq)
    }

    /// Publish every sequence up to and including `seq`. No validation.
    #[inline]
    pub fn commit(&self, seq: i64) {
        self.cursor.set(seq);
    }

    /// [`request`] followed immediately by [`commit`].
    ///
    /// [`request`]: Sequencer::request
    /// [`commit`]: Sequencer::commit
    pub fn next(&self, n: usize) -> Result<i64> {
        let seq = self.request(n)?;
        self.commit(seq);
        Ok(seq)
    }

    /// Append cursors this sequencer must not overtake.
    pub fn add_gating_sequence(&self, seqs: &[Arc<Sequence>]) {
        self.gates.write().extend(seqs.iter().cloned());
    }

    /// Deregistration is not supported; the call is accepted and ignored.
    pub fn remove_gating_sequence(&self, _seq: &Arc<Sequence>) {
        // TODO: prune the matching handle via Arc::ptr_eq once there is a
        // policy for a producer parked on a removed consumer's cursor.
    }

    /// Minimum of the gating cursors, seeded with `seed`.
    fn min_gate(&self, seed: i64) -> i64 {
        let gates = self.gates.read();
        gates.iter().map(|gate| gate.get()).fold(seed, i64::min)
    }
}
