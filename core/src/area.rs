//! Composite dispatcher for one feature area
//!
//! A [`FeatureArea`] owns an explicit, ordered list of registered lifecycles.
//! For every dispatched action it:
//!
//! 1. initializes a `null` state to `{}`,
//! 2. finds the first lifecycle whose action types contain `action.type`
//!    (no match: the state `Arc` is returned untouched),
//! 3. runs that lifecycle's reducer against the area state,
//! 4. nests the partial under the action's store index, if it resolves,
//! 5. requests navigation when the action carries `newRoute`,
//! 6. merges the partial into a fresh copy of the area state.
//!
//! # Example
//!
//! ```
//! use reflux_core::area::FeatureArea;
//! use reflux_core::action::{ActionTypes, DispatchedAction, Flavor};
//! use reflux_core::lifecycle::RegisteredLifecycle;
//! use reflux_core::reducer::{LifecycleReducer, Overrides};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let load = LifecycleReducer::new(ActionTypes::derive("LOAD", Flavor::Async), Overrides::default());
//! let area = FeatureArea::new("products").with_lifecycle(RegisteredLifecycle::new(load));
//!
//! let state = Arc::new(json!({}));
//! let action = DispatchedAction::new("LOAD_SUCCESS").with_store_index("list").with_data(json!([1]));
//! let reduction = area.reduce(&state, &action);
//!
//! assert_eq!(*reduction.state, json!({ "list": { "data": [1], "loading": false } }));
//! ```

use crate::action::DispatchedAction;
use crate::effect::{Effect, Effects};
use crate::environment::Navigator;
use crate::lifecycle::RegisteredLifecycle;
use crate::merge::merge;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Outcome of reducing one action in one feature area
#[derive(Debug, Clone)]
pub struct Reduction {
    /// The new area state; the input `Arc` itself when nothing matched
    pub state: Arc<Value>,
    /// Side effects to run
    pub effects: Effects,
    /// Whether a registered lifecycle answered the action
    pub matched: bool,
}

impl Reduction {
    fn unchanged(state: &Arc<Value>) -> Self {
        Self {
            state: Arc::clone(state),
            effects: Effects::new(),
            matched: false,
        }
    }
}

/// The set of lifecycles making up one feature area
#[derive(Debug, Clone)]
pub struct FeatureArea {
    name: String,
    lifecycles: Vec<RegisteredLifecycle>,
}

impl FeatureArea {
    /// An empty feature area called `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifecycles: Vec::new(),
        }
    }

    /// Register `lifecycle`
    ///
    /// Registration order is match order. Overlapping action types are
    /// accepted; the earlier registration keeps answering them.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: RegisteredLifecycle) -> Self {
        self.register(lifecycle);
        self
    }

    /// Register `lifecycle` in place
    pub fn register(&mut self, lifecycle: RegisteredLifecycle) {
        if let Some(existing) = self
            .lifecycles
            .iter()
            .find(|existing| existing.types().overlaps(lifecycle.types()))
        {
            tracing::warn!(
                area = %self.name,
                existing = %existing.types().request,
                incoming = %lifecycle.types().request,
                "Lifecycle action types collide; the earlier registration wins"
            );
        }
        self.lifecycles.push(lifecycle);
    }

    /// The area's name (its key in the root state)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered lifecycles, in match order
    #[must_use]
    pub fn lifecycles(&self) -> &[RegisteredLifecycle] {
        &self.lifecycles
    }

    /// True if some lifecycle answers `action_type`
    #[must_use]
    pub fn handles(&self, action_type: &str) -> bool {
        self.owner_of(action_type).is_some()
    }

    fn owner_of(&self, action_type: &str) -> Option<&RegisteredLifecycle> {
        self.lifecycles
            .iter()
            .find(|lifecycle| lifecycle.types().contains(action_type))
    }

    /// Reduce `action` against `state`
    ///
    /// A `null` state is initialized to an empty area first, so even an
    /// unmatched action then yields a fresh `{}`.
    #[must_use]
    pub fn reduce(&self, state: &Arc<Value>, action: &DispatchedAction) -> Reduction {
        let initialized;
        let state = if state.is_null() {
            initialized = Arc::new(Value::Object(Map::new()));
            &initialized
        } else {
            state
        };

        let Some(lifecycle) = self.owner_of(&action.action_type) else {
            return Reduction::unchanged(state);
        };

        let current = state.as_ref().clone();

        // Owner was found by action type, so the reducer always answers
        let Some(mut partial) = lifecycle.reducer().reduce(&current, action) else {
            return Reduction::unchanged(state);
        };

        if let Some(key) = action.resolved_index() {
            let mut scoped = Map::new();
            scoped.insert(key, partial);
            partial = Value::Object(scoped);
        }

        let mut effects = Effects::new();
        if let Some(route) = &action.new_route {
            effects.push(Effect::Navigate {
                route: route.clone(),
            });
        }

        let mut next = current;
        if partial.is_object() {
            merge(&mut next, partial);
        } else {
            tracing::warn!(
                area = %self.name,
                action_type = %action.action_type,
                partial = %partial,
                "Reducer produced a non-object partial without a store index; ignoring it"
            );
        }

        tracing::trace!(area = %self.name, action_type = %action.action_type, "Reduced action");

        Reduction {
            state: Arc::new(next),
            effects,
            matched: true,
        }
    }

    /// Reduce `action` and execute its effects against `navigator` right away
    #[must_use]
    pub fn reduce_and_navigate(
        &self,
        state: &Arc<Value>,
        action: &DispatchedAction,
        navigator: &dyn Navigator,
    ) -> Arc<Value> {
        let reduction = self.reduce(state, action);
        for effect in &reduction.effects {
            effect.execute(navigator);
        }
        reduction.state
    }
}
