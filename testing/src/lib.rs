//! # Eventure Testing
//!
//! Testing utilities and helpers for Eventure reducers and stores.
//!
//! This crate provides:
//! - A deterministic [`FixedClock`]
//! - The fluent [`ReducerTest`] builder
//! - Helpers that drive effect futures to completion outside a store
//!
//! ## Example
//!
//! ```ignore
//! use eventure_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(AdmissionReducer::new())
//!     .with_env(test_environment())
//!     .given_state(state_with_ledger(event_id, 2))
//!     .when_action(RsvpAction::LedgersInvalidated)
//!     .then_state(|state| assert_eq!(state.cached_ledgers(), 0))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use eventure_core::environment::Clock;

/// Fluent Given-When-Then reducer tests
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventure_testing::mocks::FixedClock;
    /// use eventure_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2026-03-02 09:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Helpers for running effects without a store
pub mod helpers {
    use eventure_core::effect::Effect;

    /// Await every future in `effects` and collect the actions they produce.
    ///
    /// `Parallel` effects are flattened; `None` contributes nothing. Futures
    /// run one after another, in order.
    pub async fn drain_effects<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut pending: Vec<Effect<A>> = effects.into_iter().collect();
        pending.reverse();

        let mut actions = Vec::new();
        while let Some(effect) = pending.pop() {
            match effect {
                Effect::None => {},
                Effect::Parallel(inner) => pending.extend(inner.into_iter().rev()),
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        actions.push(action);
                    }
                },
            }
        }
        actions
    }
}

// Re-export commonly used items
pub use helpers::drain_effects;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
