//! Sequence coordination: cursors, gating, and the reserve/commit protocol
//!
//! This module is the concurrency half of the library. A [`Sequence`] is a
//! cache-line padded monotonic cursor; a [`Sequencer`] couples one with the
//! cursors it must not overtake and runs the admission tests that give the
//! ring its back-pressure; a [`WaitStrategy`] decides how a parked request
//! burns the time until its gates advance.

pub mod sequence;
pub mod sequencer;
pub mod wait_strategy;

// Re-export main types
pub use sequence::Sequence;
pub use sequencer::{ Sequencer, SequencerKind };
pub use wait_strategy::{
    create_strategy,
    BusySpinWaitStrategy,
    SleepingWaitStrategy,
    WaitStrategy,
    WaitStrategyType,
    YieldingWaitStrategy,
};
