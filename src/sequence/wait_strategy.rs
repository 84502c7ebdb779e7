//! Wait strategies for parked sequence requests
//!
//! A sequencer whose admission test fails re-checks the minimum of its
//! gating cursors in a loop, invoking a wait strategy once per failed
//! check. Strategies trade latency against CPU usage; none of them uses a
//! blocking primitive, so the hot path stays lock-free.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Decides how a sequencer waits between admission checks.
pub trait WaitStrategy: Send + Sync {
    /// Park the calling thread once. `spins` counts the failed admission
    /// checks of the current request, starting at zero.
    fn park(&self, spins: u64);
}

/// Busy spin wait strategy - lowest latency, one core pinned while parked
pub struct BusySpinWaitStrategy;

impl BusySpinWaitStrategy {
    /// Create a new busy spin wait strategy
    pub fn new() -> Self {
        Self
    }
}

impl Default for BusySpinWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for BusySpinWaitStrategy {
    #[inline]
    fn park(&self, _spins: u64) {
        std::hint::spin_loop();
    }
}

/// Yielding wait strategy - hands the core back to the OS scheduler on
/// every failed check. This is the default.
pub struct YieldingWaitStrategy;

impl YieldingWaitStrategy {
    /// Create a new yielding wait strategy
    pub fn new() -> Self {
        Self
    }
}

impl Default for YieldingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for YieldingWaitStrategy {
    #[inline]
    fn park(&self, _spins: u64) {
        thread::yield_now();
    }
}

/// Sleeping wait strategy - lowest CPU usage, highest latency
///
/// Spins for a bounded number of checks, then sleeps for the configured
/// duration on each further check.
pub struct SleepingWaitStrategy {
    spin_tries: u64,
    sleep_duration: Duration,
}

impl SleepingWaitStrategy {
    /// Create a new sleeping wait strategy with a custom sleep duration
    pub fn new(sleep_duration: Duration) -> Self {
        Self {
            spin_tries: 100,
            sleep_duration,
        }
    }

    /// Create a new sleeping wait strategy with the default sleep duration (1ms)
    pub fn default_sleep() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Default for SleepingWaitStrategy {
    fn default() -> Self {
        Self::default_sleep()
    }
}

impl WaitStrategy for SleepingWaitStrategy {
    fn park(&self, spins: u64) {
        if spins < self.spin_tries {
            std::hint::spin_loop();
        } else {
            thread::sleep(self.sleep_duration);
        }
    }
}

/// Available wait strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategyType {
    /// Busy spin for lowest latency
    BusySpin,
    /// Yield to the scheduler for balanced latency and CPU usage
    Yielding,
    /// Sleep after a short spin phase for lowest CPU usage
    Sleeping,
}

impl Default for WaitStrategyType {
    fn default() -> Self {
        Self::Yielding
    }
}

/// Create a wait strategy instance from the given type
pub fn create_strategy(strategy_type: WaitStrategyType) -> Arc<dyn WaitStrategy> {
    match strategy_type {
        WaitStrategyType::BusySpin => Arc::new(BusySpinWaitStrategy::new()),
        WaitStrategyType::Yielding => Arc::new(YieldingWaitStrategy::new()),
        WaitStrategyType::Sleeping => Arc::new(SleepingWaitStrategy::default_sleep()),
    }
}
