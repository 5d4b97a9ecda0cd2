//! Ergonomic testing utilities for feature areas
//!
//! This module provides a fluent API for testing a [`FeatureArea`] with
//! readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // AreaTest is the natural name

use reflux_core::action::DispatchedAction;
use reflux_core::area::FeatureArea;
use reflux_core::effect::Effect;
use serde_json::Value;
use std::sync::Arc;

/// Type alias for state assertion functions
type StateAssertion = Box<dyn FnOnce(&Value)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Fluent API for testing feature areas with Given-When-Then syntax
///
/// Actions are reduced in the order they were given; effects from every
/// action are collected for the effect assertions.
///
/// # Example
///
/// ```ignore
/// use reflux_testing::AreaTest;
///
/// AreaTest::new(cart_area())
///     .given_state(json!({}))
///     .when_action(DispatchedAction::new("FETCH_CART_REQUEST").with_store_index("cart"))
///     .then_state(|state| {
///         assert_eq!(state["cart"]["loading"], true);
///     })
///     .then_effects(|effects| {
///         assert!(effects.is_empty());
///     })
///     .run();
/// ```
pub struct AreaTest {
    area: FeatureArea,
    initial_state: Option<Value>,
    actions: Vec<DispatchedAction>,
    expect_unchanged: bool,
    state_assertions: Vec<StateAssertion>,
    effect_assertions: Vec<EffectAssertion>,
}

impl AreaTest {
    /// Create a new test for `area`
    #[must_use]
    pub const fn new(area: FeatureArea) -> Self {
        Self {
            area,
            initial_state: None,
            actions: Vec::new(),
            expect_unchanged: false,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the initial area state (Given)
    #[must_use]
    pub fn given_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    #[must_use]
    pub fn when_action(mut self, action: DispatchedAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Assert that no action matched and the state `Arc` was handed back as is (Then)
    #[must_use]
    pub const fn then_unchanged(mut self) -> Self {
        self.expect_unchanged = true;
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Value) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the collected effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if no action was given, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    pub fn run(self) {
        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let initial = Arc::new(self.initial_state.unwrap_or(Value::Null));
        let mut state = Arc::clone(&initial);
        let mut effects = Vec::new();

        for action in &self.actions {
            let reduction = self.area.reduce(&state, action);
            effects.extend(reduction.effects);
            state = reduction.state;
        }

        if self.expect_unchanged {
            assert!(
                Arc::ptr_eq(&initial, &state),
                "Expected the state to be returned unchanged, but it was replaced with {state}"
            );
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use reflux_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            effects.is_empty(),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert that effects are exactly one navigation to `route`
    ///
    /// # Panics
    ///
    /// Panics if the effects differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_navigates_to(effects: &[Effect], route: &str) {
        assert_eq!(
            effects,
            [Effect::Navigate {
                route: route.to_string()
            }],
            "Expected a single navigation to {route}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflux_core::action::{ActionTypes, Flavor};
    use reflux_core::lifecycle::RegisteredLifecycle;
    use reflux_core::reducer::{LifecycleReducer, Overrides};
    use serde_json::json;

    fn area() -> FeatureArea {
        FeatureArea::new("test").with_lifecycle(RegisteredLifecycle::new(LifecycleReducer::new(
            ActionTypes::derive("LOAD", Flavor::Async),
            Overrides::default(),
        )))
    }

    #[test]
    fn test_area_test_request_then_success() {
        AreaTest::new(area())
            .given_state(json!({}))
            .when_action(DispatchedAction::new("LOAD_REQUEST").with_store_index("item"))
            .when_action(
                DispatchedAction::new("LOAD_SUCCESS")
                    .with_store_index("item")
                    .with_data(json!(5)),
            )
            .then_state(|state| {
                assert_eq!(state["item"], json!({ "data": 5, "loading": false }));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_area_test_unchanged() {
        AreaTest::new(area())
            .given_state(json!({ "kept": true }))
            .when_action(DispatchedAction::new("UNKNOWN"))
            .then_unchanged()
            .run();
    }

    #[test]
    fn test_area_test_navigation() {
        AreaTest::new(area())
            .when_action(DispatchedAction::new("LOAD_SUCCESS").with_route(Some("/next".to_string())))
            .then_effects(|effects| assertions::assert_navigates_to(effects, "/next"))
            .run();
    }
}
