//! # Clubhouse Testing
//!
//! Testing utilities and helpers for the Clubhouse portal crates.
//!
//! This crate provides:
//! - A fixed clock for deterministic join dates and "upcoming" cut-offs
//! - The Given-When-Then [`ReducerTest`] harness
//! - [`collect_actions`] to run reducer effects without a Store
//!
//! ## Example
//!
//! ```ignore
//! use clubhouse_testing::{collect_actions, test_clock};
//!
//! #[tokio::test]
//! async fn load_sessions() {
//!     let env = BookingEnvironment::new(MockProfileStore::new(), Arc::new(test_clock()));
//!     let mut state = BookingState::default();
//!     let effects = BookingReducer::new().reduce(&mut state, BookingAction::LoadSessions, &env);
//!     let actions = collect_actions(effects).await;
//!     assert!(matches!(actions[0], BookingAction::SessionsLoaded { .. }));
//! }
//! ```

use chrono::{DateTime, Utc};
use clubhouse_core::environment::Clock;


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
    /// use clubhouse_testing::mocks::FixedClock;
    /// use clubhouse_core::environment::Clock;
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

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, collect_actions, ReducerTest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
