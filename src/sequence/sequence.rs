//! Cache-line padded sequence counter.

use std::sync::atomic::{ AtomicI64, Ordering };

use static_assertions::const_assert_eq;

use crate::constants::{ CACHE_LINE_SIZE, INITIAL_SEQUENCE_VALUE };

/// A participant's position in the record stream.
///
/// Holds the published cursor together with a cached snapshot of the
/// minimum of the participant's gating cursors. The pair is padded to
/// occupy exactly one cache line so adjacent sequences never share one.
///
/// The cursor is written only by its owning participant and read by every
/// participant gating on it. The cached gate is private to the owner;
/// staleness is permitted and corrected lazily by the sequencer.
#[repr(C, align(64))]
pub struct Sequence {
    cursor: AtomicI64,
    cached_gate: AtomicI64,
    _padding: [u8; CACHE_LINE_SIZE - 16],
}

const_assert_eq!(std::mem::size_of::<Sequence>(), CACHE_LINE_SIZE);

impl Sequence {
    /// Create a sequence at the initial position, before the first slot.
    pub fn new() -> Self {
        Self {
            cursor: AtomicI64::new(INITIAL_SEQUENCE_VALUE),
            cached_gate: AtomicI64::new(INITIAL_SEQUENCE_VALUE),
            _padding: [0; CACHE_LINE_SIZE - 16],
        }
    }

    /// Current cursor value (acquire load).
    #[inline]
    pub fn get(&self) -> i64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Publish a new cursor value (release store). The cursor must never
    /// move backward; a violation is a programming error, not reported.
    #[inline]
    pub fn set(&self, seq: i64) {
        self.cursor.store(seq, Ordering::Release);
    }

    /// Last cached minimum of the gating cursors. May be stale.
    #[inline]
    pub(crate) fn cached_gate(&self) -> i64 {
        self.cached_gate.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cached_gate(&self, seq: i64) {
        self.cached_gate.store(seq, Ordering::Relaxed);
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}
