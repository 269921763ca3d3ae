//! # Ticketbook Testing
//!
//! Testing utilities and helpers for the ticketbook architecture.
//!
//! This crate provides:
//! - Mock implementations of environment traits
//! - A fluent Given/When/Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use ticketbook_testing::{ReducerTest, assertions, mocks::FixedClock};
//!
//! ReducerTest::new(TicketReducer::new())
//!     .with_env(test_environment())
//!     .given_state(TicketState::new())
//!     .when_action(TicketAction::DeleteTicket { id })
//!     .then_state(|state| assert_eq!(state.count(), 0))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use ticketbook_core::environment::{Clock, IdGenerator};
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    #[derive(Clone, Copy, Debug)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock pinned to the given time
        #[must_use]
        pub const fn at(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Create a clock pinned to the Unix epoch
        #[must_use]
        pub fn epoch() -> Self {
            Self {
                time: DateTime::UNIX_EPOCH,
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by a fixed step on every reading
    ///
    /// Useful for asserting that a timestamp strictly increased across two
    /// operations without sleeping in tests.
    #[derive(Debug)]
    pub struct SteppingClock {
        start: DateTime<Utc>,
        step: Duration,
        ticks: AtomicU64,
    }

    impl SteppingClock {
        /// Create a clock starting at `start`, advancing by `step` per call
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                start,
                step,
                ticks: AtomicU64::new(0),
            }
        }

        /// Create a clock starting at the Unix epoch with one-second steps
        #[must_use]
        pub fn from_epoch() -> Self {
            Self::new(DateTime::UNIX_EPOCH, Duration::seconds(1))
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            let offset = i32::try_from(tick).unwrap_or(i32::MAX);
            self.start + self.step * offset
        }
    }

    /// Id generator producing predictable sequential ids
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Create a generator starting at id 0
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }

        /// The id the generator produces on its `n`th call (0-indexed)
        #[must_use]
        pub const fn nth(n: u64) -> Uuid {
            Uuid::from_u128(n as u128)
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> Uuid {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            Self::nth(n)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn fixed_clock_is_constant() {
            let clock = FixedClock::epoch();
            assert_eq!(clock.now(), clock.now());
        }

        #[test]
        fn stepping_clock_strictly_increases() {
            let clock = SteppingClock::from_epoch();
            let first = clock.now();
            let second = clock.now();
            assert!(second > first);
        }

        #[test]
        fn sequential_ids_are_predictable() {
            let ids = SequentialIdGenerator::new();
            assert_eq!(ids.next_id(), SequentialIdGenerator::nth(0));
            assert_eq!(ids.next_id(), SequentialIdGenerator::nth(1));
        }
    }
}
