//! Ring buffer assembly: byte arena plus handle registration
//!
//! The [`RingBuffer`] owns the storage arena and a registry of the
//! sequencers handed out to participants. Registration takes a write lock
//! and wires the gating graph symmetrically: a new producer gates on every
//! existing consumer and vice versa. The hot paths ([`Producer::put`],
//! [`Consumer::get`]) never touch the registry lock; they interact only
//! with atomically updated sequences and the arena.
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
//! producer.put(b"first")?;
//! producer.put(b"second")?;
//!
//! assert_eq!(consumer.get()?, b"first");
//! assert_eq!(consumer.get()?, b"second");
//! # Ok::<(), bytering::RingError>(())
//! ```

pub(crate) mod arena;
pub mod consumer;
pub mod producer;

pub use consumer::Consumer;
pub use producer::Producer;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::constants::{ MAX_DATA_SLOTS, MAX_PRODUCER_COUNT, MIN_SLOT_SIZE, SLOT_OVERHEAD };
use crate::error::{ Result, RingError };
use crate::ring::arena::ByteArena;
use crate::sequence::{ create_strategy, Sequencer, WaitStrategyType };

/// Configuration for a ring buffer
#[derive(Debug, Clone, Copy)]
pub struct RingBufferConfig {
    /// Per-slot data capacity in bytes, prefix overhead not included
    pub slot_size: usize,
    /// Number of slots; must be a power of two
    pub slot_count: usize,
    /// How parked participants wait for gated cursors to advance
    pub wait_strategy: WaitStrategyType,
}

impl RingBufferConfig {
    /// Create a validated configuration with the default wait strategy.
    pub fn new(slot_size: usize, slot_count: usize) -> Result<Self> {
        let config = Self {
            slot_size,
            slot_count,
            wait_strategy: WaitStrategyType::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the wait strategy.
    pub fn with_wait_strategy(mut self, strategy: WaitStrategyType) -> Self {
        self.wait_strategy = strategy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.slot_size < MIN_SLOT_SIZE {
            return Err(RingError::SlotTooSmall(self.slot_size));
        }
        if self.slot_count > MAX_DATA_SLOTS {
            return Err(RingError::CapacityExceeded(self.slot_count));
        }
        if self.slot_count == 0 || !self.slot_count.is_power_of_two() {
            return Err(RingError::NotPowerOfTwo(self.slot_count));
        }
        Ok(())
    }
}

#[derive(Default)]
struct HandleRegistry {
    producers: Vec<Arc<Sequencer>>,
    consumers: Vec<Arc<Sequencer>>,
}

/// A bounded, lock-free ring buffer for variable-length byte records.
///
/// One producer writes length-prefixed records into a fixed arena of
/// power-of-two slots; any number of independent consumers read the full
/// stream, each at its own pace. Back-pressure is part of the protocol:
/// the producer busy-waits instead of overwriting records a consumer has
/// not passed, and nothing is ever dropped.
///
/// Handles hold shared references to the arena, so they may outlive the
/// `RingBuffer` value itself; the storage is freed when the last handle
/// goes away.
pub struct RingBuffer {
    arena: Arc<ByteArena>,
    wait_strategy: WaitStrategyType,
    registry: RwLock<HandleRegistry>,
}

impl RingBuffer {
    /// Create a buffer of `slot_count` slots, each holding up to
    /// `slot_size` payload bytes, with the default wait strategy.
    ///
    /// # Errors
    ///
    /// [`RingError::SlotTooSmall`] when `slot_size` is below 2,
    /// [`RingError::CapacityExceeded`] when `slot_count` exceeds the
    /// maximum, [`RingError::NotPowerOfTwo`] when it is not a power of
    /// two.
    pub fn new(slot_size: usize, slot_count: usize) -> Result<Self> {
        Self::with_config(RingBufferConfig::new(slot_size, slot_count)?)
    }

    /// Create a buffer from a configuration.
    pub fn with_config(config: RingBufferConfig) -> Result<Self> {
        config.validate()?;

        // Each slot carries its data capacity plus the length prefix.
        let slot_size = config.slot_size + SLOT_OVERHEAD;

        debug!(
            slot_size,
            slot_count = config.slot_count,
            wait_strategy = ?config.wait_strategy,
            "creating ring buffer"
        );

        Ok(Self {
            arena: Arc::new(ByteArena::new(slot_size, config.slot_count)),
            wait_strategy: config.wait_strategy,
            registry: RwLock::new(HandleRegistry::default()),
        })
    }

    /// Padded slot size in bytes. This differs from the configured value:
    /// the prefix overhead has been added.
    pub fn slot_size(&self) -> usize {
        self.arena.slot_size()
    }

    /// Number of slots in the buffer.
    pub fn slot_count(&self) -> usize {
        self.arena.slot_count()
    }

    /// Register the buffer's producer.
    ///
    /// At most one producer exists per buffer; a second call fails with
    /// [`RingError::TooManyProducers`]. The new producer gates on every
    /// already-registered consumer, and every consumer gains the producer
    /// as a gate.
    pub fn new_producer(&self) -> Result<Producer> {
        let mut registry = self.registry.write();

        if registry.producers.len() >= MAX_PRODUCER_COUNT {
            return Err(RingError::TooManyProducers);
        }

        let sequencer = Arc::new(
            Sequencer::producer(self.arena.slot_count(), create_strategy(self.wait_strategy))?
        );

        for consumer in &registry.consumers {
            consumer.add_gating_sequence(&[Arc::clone(sequencer.sequence())]);
            sequencer.add_gating_sequence(&[Arc::clone(consumer.sequence())]);
        }

        registry.producers.push(Arc::clone(&sequencer));
        debug!(consumers = registry.consumers.len(), "registered producer");

        Ok(Producer::new(Arc::clone(&self.arena), sequencer))
    }

    /// Register a new consumer.
    ///
    /// Consumers are independent: each receives the full record stream at
    /// its own pace, and any number may be registered. The new consumer
    /// gates on every already-registered producer, and every producer
    /// gains the consumer as a gate.
    pub fn new_consumer(&self) -> Result<Consumer> {
        let mut registry = self.registry.write();

        let sequencer = Arc::new(
            Sequencer::consumer(self.arena.slot_count(), create_strategy(self.wait_strategy))?
        );

        for producer in &registry.producers {
            producer.add_gating_sequence(&[Arc::clone(sequencer.sequence())]);
            sequencer.add_gating_sequence(&[Arc::clone(producer.sequence())]);
        }

        registry.consumers.push(Arc::clone(&sequencer));
        debug!(consumers = registry.consumers.len(), "registered consumer");

        Ok(Consumer::new(Arc::clone(&self.arena), sequencer))
    }

    #[cfg(test)]
    fn arena_snapshot(&self) -> Vec<u8> {
        self.arena.snapshot()
    }

    #[cfg(test)]
    fn producer_cursor(&self) -> i64 {
        self.registry.read().producers[0].get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use proptest::prelude::*;

    fn init_test_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            RingBufferConfig::new(1, 16).err(),
            Some(RingError::SlotTooSmall(1))
        );
        assert_eq!(
            RingBufferConfig::new(4, 65_536).err(),
            Some(RingError::CapacityExceeded(65_536))
        );
        assert_eq!(
            RingBufferConfig::new(4, 12).err(),
            Some(RingError::NotPowerOfTwo(12))
        );

        let config = RingBufferConfig::new(4, 16)
            .unwrap()
            .with_wait_strategy(WaitStrategyType::BusySpin);
        assert_eq!(config.wait_strategy, WaitStrategyType::BusySpin);
    }

    #[test]
    fn test_slot_size_is_padded() {
        let ring = RingBuffer::new(10, 128).unwrap();
        assert_eq!(ring.slot_size(), 12);
        assert_eq!(ring.slot_count(), 128);
    }

    #[test]
    fn test_second_producer_is_rejected() {
        let ring = RingBuffer::new(10, 128).unwrap();

        let _producer = ring.new_producer().unwrap();
        assert_eq!(ring.new_producer().err(), Some(RingError::TooManyProducers));
    }

    #[test]
    fn test_producer_no_wrap_layout() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();

        let mut data = [1u8, 2, 3, 4];
        for i in 0..10 {
            data[0] = i;
            producer.put(&data).unwrap();
        }

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x04, 0x00, 0x00, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x01, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x02, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x03, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x04, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x05, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x06, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x07, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x08, 0x02, 0x03, 0x04,
            0x04, 0x00, 0x09, 0x02, 0x03, 0x04,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(ring.arena_snapshot(), expected);
    }

    #[test]
    fn test_producer_wrap_layout() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();

        // 7-byte records span two slots each; 10 of them lap the 16-slot
        // arena, so records 8 and 9 reclaim the front and records 2
        // through 7 survive behind them.
        let mut data = [1u8, 2, 3, 4, 5, 6, 7];
        for i in 0..10 {
            data[0] = i;
            producer.put(&data).unwrap();
        }

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x07, 0x00, 0x08, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x09, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x02, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x03, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x04, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x05, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x06, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x07, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
        ];
        assert_eq!(ring.arena_snapshot(), expected);
    }

    #[test]
    fn test_producer_variable_size_no_wrap_layout() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();

        let data: Vec<u8> = (1..=16).collect();
        for i in 0..10 {
            producer.put(&data[..i]).unwrap();
        }

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x01, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x01, 0x02, 0x00, 0x00,
            0x03, 0x00, 0x01, 0x02, 0x03, 0x00,
            0x04, 0x00, 0x01, 0x02, 0x03, 0x04,
            0x05, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x06, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x00, 0x00,
            0x09, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(ring.arena_snapshot(), expected);
    }

    #[test]
    fn test_producer_variable_size_wrap_layout() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();

        let data: Vec<u8> = (1..=16).collect();
        for i in 0..12 {
            producer.put(&data[..i]).unwrap();
        }

        // The length-11 record wraps: its tail lands in the first two
        // slots, and the length-10 record's prefix sits at slot 15.
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,
            0x0b, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,
            0x0b, 0x00, 0x01, 0x02, 0x03, 0x00,
            0x04, 0x00, 0x01, 0x02, 0x03, 0x04,
            0x05, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x06, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x00, 0x00,
            0x09, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x00,
            0x0a, 0x00, 0x01, 0x02, 0x03, 0x04,
        ];
        assert_eq!(ring.arena_snapshot(), expected);
    }

    #[test]
    fn test_consumer_reads_single_record() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();
        let mut consumer = ring.new_consumer().unwrap();

        producer.put(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(consumer.get().unwrap(), &[1, 2, 3, 4, 5, 6][..]);
    }

    #[test]
    fn test_empty_record_round_trips() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();
        let mut consumer = ring.new_consumer().unwrap();

        assert_eq!(producer.put(&[]).unwrap(), 1);
        assert_eq!(consumer.get().unwrap(), &[][..]);
    }

    #[test]
    fn test_late_consumer_starts_from_the_beginning() {
        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();

        producer.put(&[1]).unwrap();
        producer.put(&[2]).unwrap();

        // Registered after the puts, before any wrap: sees the stream
        // from sequence zero.
        let mut consumer = ring.new_consumer().unwrap();
        assert_eq!(consumer.get().unwrap(), &[1][..]);
        assert_eq!(consumer.get().unwrap(), &[2][..]);
    }

    #[test]
    fn test_one_producer_one_consumer_threaded() {
        init_test_logging();

        let ring = RingBuffer::new(4, 16).unwrap();
        let mut producer = ring.new_producer().unwrap();
        let mut consumer = ring.new_consumer().unwrap();

        const COUNT: usize = 16;
        let data = [1u8, 2, 3, 4, 5, 6];

        crossbeam::thread::scope(|s| {
            s.spawn(move |_| {
                for _ in 0..COUNT {
                    producer.put(&data).unwrap();
                }
            });

            for _ in 0..COUNT {
                assert_eq!(consumer.get().unwrap(), &data[..]);
            }
        })
        .unwrap();
    }

    #[test]
    fn test_spsc_at_scale() {
        init_test_logging();

        let ring = RingBuffer::new(128, 256).unwrap();
        let mut producer = ring.new_producer().unwrap();
        let mut consumer = ring.new_consumer().unwrap();

        const COUNT: usize = 10_000;
        let data: Vec<u8> = (0..256).map(|i| (i % 256) as u8).collect();

        crossbeam::thread::scope(|s| {
            let expected = &data;
            s.spawn(move |_| {
                for _ in 0..COUNT {
                    producer.put(expected).unwrap();
                }
            });

            for _ in 0..COUNT {
                assert_eq!(consumer.get().unwrap(), &expected[..]);
            }
        })
        .unwrap();
    }

    #[test]
    fn test_two_consumers_observe_identical_streams() {
        let ring = RingBuffer::new(128, 256).unwrap();
        let mut producer = ring.new_producer().unwrap();
        let mut consumer1 = ring.new_consumer().unwrap();
        let mut consumer2 = ring.new_consumer().unwrap();

        const COUNT: usize = 10_000;
        let data: Vec<u8> = (0..256).map(|i| (i % 256) as u8).collect();

        crossbeam::thread::scope(|s| {
            let expected = &data;

            s.spawn(move |_| {
                for _ in 0..COUNT {
                    producer.put(expected).unwrap();
                }
            });
            s.spawn(move |_| {
                for _ in 0..COUNT {
                    assert_eq!(consumer1.get().unwrap(), &expected[..]);
                }
            });

            for _ in 0..COUNT {
                assert_eq!(consumer2.get().unwrap(), &expected[..]);
            }
        })
        .unwrap();
    }

    #[test]
    fn test_backpressure_bounds_producer_lead() {
        init_test_logging();

        let ring = RingBuffer::new(4, 4).unwrap();
        let mut producer = ring.new_producer().unwrap();
        let mut consumer = ring.new_consumer().unwrap();

        const COUNT: u8 = 100;

        crossbeam::thread::scope(|s| {
            s.spawn(move |_| {
                for i in 0..COUNT {
                    producer.put(&[i, i]).unwrap();
                }
            });

            for i in 0..COUNT {
                {
                    let record = consumer.get().unwrap();
                    assert_eq!(record, &[i, i][..]);
                }

                // The producer may never run more than a buffer's worth
                // of slots ahead of this consumer's released cursor.
                let lead = ring.producer_cursor() - consumer.cursor();
                assert!(lead <= 4, "producer leads by {lead} slots");

                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
    }

    proptest! {
        // FIFO delivery: whatever sequence of payloads goes in comes back
        // out byte-identical and in order.
        #[test]
        fn prop_records_round_trip_in_order(
            payloads in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..=60),
                1..=30
            )
        ) {
            let ring = RingBuffer::new(8, 16).unwrap();
            let mut producer = ring.new_producer().unwrap();
            let mut consumer = ring.new_consumer().unwrap();

            for payload in &payloads {
                producer.put(payload).unwrap();
                prop_assert_eq!(consumer.get().unwrap(), &payload[..]);
            }
        }
    }
}
