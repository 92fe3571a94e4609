//! # Casa Roja Testing
//!
//! Test support for reducers and the effects they describe:
//!
//! - [`ReducerTest`]: Given-When-Then harness for a single reducer step
//! - [`assertions`]: effect shape assertions
//! - [`run_effects`]: executes effect descriptions and collects the actions
//!   they produce, without a `Store`
//! - [`mocks`]: deterministic clocks
//!
//! ## Example
//!
//! ```ignore
//! use casaroja_testing::{ReducerTest, assertions, test_clock};
//!
//! ReducerTest::new(LoginPageReducer::new())
//!     .with_env(test_environment())
//!     .given_state(LoginPageState::default())
//!     .when_action(LoginPageAction::Submit)
//!     .then_state(|s| assert!(s.form.errors.has(Field::Email)))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use casaroja_core::effect::Effect;
use chrono::{DateTime, Utc};
use casaroja_core::environment::Clock;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use casaroja_testing::mocks::FixedClock;
    /// use casaroja_core::environment::Clock;
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

    /// A clock tests can move forward, shared between clones.
    ///
    /// Used to age cache entries past their stale time without sleeping.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// The instant every test clock starts at: 2025-01-01 00:00:00 UTC.
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }
}

/// Execute effect descriptions and collect the actions they produce, in
/// order. Produced actions are not reduced.
pub async fn run_effects<A, I>(effects: I) -> Vec<A>
where
    I: IntoIterator<Item = Effect<A>>,
{
    let mut actions = Vec::new();
    for effect in effects {
        if let Effect::Future(fut) = effect {
            actions.extend(fut.await);
        }
    }
    actions
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, ManualClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_new_year_2025() {
        let clock = test_clock();
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn manual_clock_advances_across_clones() {
        let clock = ManualClock::new(mocks::epoch());
        let shared = clock.clone();
        shared.advance(chrono::Duration::minutes(3));
        assert_eq!(clock.now() - mocks::epoch(), chrono::Duration::minutes(3));
    }

    #[tokio::test]
    async fn run_effects_keeps_order_and_skips_silent_futures() {
        let effects = vec![
            Effect::None,
            Effect::Future(Box::pin(async { Some(1) })),
            Effect::Future(Box::pin(async { None })),
            Effect::Future(Box::pin(async { Some(3) })),
        ];

        assert_eq!(run_effects(effects).await, vec![1, 3]);
    }
}
