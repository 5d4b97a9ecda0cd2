//! # Reflux Testing
//!
//! Testing utilities and helpers for Reflux lifecycles and feature areas.
//!
//! This crate provides:
//! - Recording implementations of the [`Store`](reflux_core::environment::Store)
//!   and [`Navigator`](reflux_core::environment::Navigator) traits
//! - [`AreaTest`], a Given-When-Then harness for feature areas
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use reflux_testing::mocks::RecordingStore;
//!
//! #[tokio::test]
//! async fn fetch_dispatches_request_first() {
//!     let store = Arc::new(RecordingStore::new());
//!     let env = Environment::new(store.clone(), Arc::new(EnvelopeParser));
//!     let fetch = fetch_cart_lifecycle().build(&env);
//!
//!     fetch.run("c-1".to_string()).await.unwrap();
//!
//!     assert_eq!(store.action_types(), ["FETCH_CART_REQUEST", "FETCH_CART_SUCCESS"]);
//! }
//! ```

pub mod area_test;

pub use area_test::{AreaTest, assertions};

/// Recording implementations of the environment traits
pub mod mocks {
    use futures::stream::{self, BoxStream, StreamExt};
    use reflux_core::action::DispatchedAction;
    use reflux_core::environment::{
        EnvelopeParser, Navigator, ParsedResponse, ResponseParser, Store,
    };
    use reflux_core::state::StatePath;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Store that records every dispatched action and reduces nothing
    ///
    /// State queries answer from a fixed value set with [`with_state`](Self::with_state).
    ///
    /// # Example
    ///
    /// ```
    /// use reflux_core::action::DispatchedAction;
    /// use reflux_core::environment::Store;
    /// use reflux_testing::mocks::RecordingStore;
    ///
    /// let store = RecordingStore::new();
    /// store.dispatch(DispatchedAction::new("PING"));
    /// assert_eq!(store.action_types(), ["PING"]);
    /// ```
    #[derive(Debug, Default)]
    pub struct RecordingStore {
        actions: Mutex<Vec<DispatchedAction>>,
        state: Mutex<Value>,
    }

    impl RecordingStore {
        /// Empty store with `null` state
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Store answering state queries from `state`
        #[must_use]
        pub fn with_state(state: Value) -> Self {
            Self {
                actions: Mutex::new(Vec::new()),
                state: Mutex::new(state),
            }
        }

        /// Every action dispatched so far, in order
        #[must_use]
        pub fn actions(&self) -> Vec<DispatchedAction> {
            self.actions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }

        /// The `type` of every action dispatched so far
        #[must_use]
        pub fn action_types(&self) -> Vec<String> {
            self.actions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .iter()
                .map(|action| action.action_type.clone())
                .collect()
        }

        /// Forget recorded actions
        pub fn clear(&self) {
            self.actions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clear();
        }
    }

    impl Store for RecordingStore {
        fn dispatch(&self, action: DispatchedAction) {
            self.actions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(action);
        }

        fn get_state(&self, path: &StatePath) -> Option<Value> {
            path.lookup(
                &self
                    .state
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner),
            )
            .cloned()
        }

        fn select(&self, path: &StatePath) -> BoxStream<'static, Value> {
            let current = self.get_state(path).unwrap_or(Value::Null);
            stream::iter([current]).boxed()
        }
    }

    /// Navigator that records requested routes
    #[derive(Debug, Default)]
    pub struct RecordingNavigator {
        routes: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        /// Empty navigator
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Routes navigated to so far, in order
        #[must_use]
        pub fn routes(&self) -> Vec<String> {
            self.routes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate_by_url(&self, path: &str) {
            self.routes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(path.to_string());
        }
    }

    /// Parser that records every raw response and decodes it as an envelope
    #[derive(Debug, Default)]
    pub struct RecordingParser {
        seen: Mutex<Vec<Value>>,
    }

    impl RecordingParser {
        /// Empty parser
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Raw responses parsed so far, in order
        #[must_use]
        pub fn seen(&self) -> Vec<Value> {
            self.seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    impl ResponseParser for RecordingParser {
        fn parse(&self, raw: &Value) -> ParsedResponse {
            self.seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(raw.clone());
            EnvelopeParser.parse(raw)
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-writer tracing subscriber honoring `RUST_LOG`
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{RecordingNavigator, RecordingParser, RecordingStore};

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use reflux_core::action::DispatchedAction;
    use reflux_core::environment::{Navigator, Store};
    use reflux_core::state::StatePath;
    use serde_json::json;

    #[test]
    fn test_recording_store_keeps_order() {
        let store = RecordingStore::new();
        store.dispatch(DispatchedAction::new("A"));
        store.dispatch(DispatchedAction::new("B"));
        assert_eq!(store.action_types(), ["A", "B"]);

        store.clear();
        assert!(store.actions().is_empty());
    }

    #[test]
    fn test_recording_store_answers_from_fixed_state() {
        let store = RecordingStore::with_state(json!({ "shop": { "cart": { "loading": true } } }));
        assert_eq!(
            store.get_state(&StatePath::parse("shop.cart.loading")),
            Some(json!(true))
        );
        assert_eq!(store.get_state(&StatePath::parse("shop.missing")), None);
    }

    #[tokio::test]
    async fn test_recording_store_select_emits_current_value() {
        let store = RecordingStore::with_state(json!({ "a": 1 }));
        let values: Vec<_> = store.select(&StatePath::parse("a")).collect().await;
        assert_eq!(values, vec![json!(1)]);
    }

    #[test]
    fn test_recording_parser_delegates_to_envelope() {
        use reflux_core::environment::ResponseParser;

        let parser = RecordingParser::new();
        let parsed = parser.parse(&json!({ "responseData": 1 }));
        assert_eq!(parsed.response_data, json!(1));
        assert_eq!(parser.seen(), vec![json!({ "responseData": 1 })]);
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate_by_url("/cart");
        assert_eq!(navigator.routes(), ["/cart"]);
    }
}
