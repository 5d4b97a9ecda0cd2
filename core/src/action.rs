//! Action types and the dispatched action envelope
//!
//! A lifecycle is identified by a base name `N`. From it three action types are
//! derived once, at build time:
//!
//! | Phase   | Asynchronous   | Synchronous |
//! |---------|----------------|-------------|
//! | request | `N_REQUEST`    | `N`         |
//! | success | `N_SUCCESS`    | `N_SUCCESS` |
//! | failure | `N_FAILURE`    | `N_FAILURE` |
//!
//! Every action that flows through a store is a [`DispatchedAction`]. It
//! serializes to the same JSON shape the action log and devtools expect:
//!
//! ```json
//! { "type": "FETCH_CART_SUCCESS", "storeIndex": "cart", "data": { "items": [] } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field a structured [`StoreIndex`] carries its effective key in
pub const NAME_FIELD: &str = "_name";

const REQUEST_SUFFIX: &str = "_REQUEST";
const SUCCESS_SUFFIX: &str = "_SUCCESS";
const FAILURE_SUFFIX: &str = "_FAILURE";

/// Whether a lifecycle has a distinct loading phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Tracked loading: request, then success or failure later
    Async,
    /// Untracked: the request dispatch is the completion
    Sync,
}

impl Flavor {
    /// Map the builder's `is_async` flag onto a flavor
    #[must_use]
    pub const fn from_async(is_async: bool) -> Self {
        if is_async { Self::Async } else { Self::Sync }
    }

    /// True for [`Flavor::Async`]
    #[must_use]
    pub const fn is_async(self) -> bool {
        matches!(self, Self::Async)
    }
}

/// One of the three phases of a lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Work started (or, for synchronous lifecycles, completed)
    Request,
    /// Deferred work settled successfully
    Success,
    /// Work failed
    Failure,
}

/// The immutable `{request, success, failure}` action-type triple of a lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionTypes {
    /// Request action type
    pub request: String,
    /// Success action type
    pub success: String,
    /// Failure action type
    pub failure: String,
    /// Flavor the triple was derived for
    pub flavor: Flavor,
}

impl ActionTypes {
    /// Derive the triple for `name`
    ///
    /// # Example
    ///
    /// ```
    /// use reflux_core::action::{ActionTypes, Flavor};
    ///
    /// let types = ActionTypes::derive("FETCH_CART", Flavor::Async);
    /// assert_eq!(types.request, "FETCH_CART_REQUEST");
    ///
    /// let types = ActionTypes::derive("SET_FILTER", Flavor::Sync);
    /// assert_eq!(types.request, "SET_FILTER");
    /// assert_eq!(types.success, "SET_FILTER_SUCCESS");
    /// ```
    #[must_use]
    pub fn derive(name: &str, flavor: Flavor) -> Self {
        let request = match flavor {
            Flavor::Async => format!("{name}{REQUEST_SUFFIX}"),
            Flavor::Sync => name.to_string(),
        };

        Self {
            request,
            success: format!("{name}{SUCCESS_SUFFIX}"),
            failure: format!("{name}{FAILURE_SUFFIX}"),
            flavor,
        }
    }

    /// Which phase `action_type` belongs to, if any
    ///
    /// Request is checked first, then success, then failure.
    #[must_use]
    pub fn phase_of(&self, action_type: &str) -> Option<Phase> {
        if action_type == self.request {
            Some(Phase::Request)
        } else if action_type == self.success {
            Some(Phase::Success)
        } else if action_type == self.failure {
            Some(Phase::Failure)
        } else {
            None
        }
    }

    /// True when `action_type` is one of the three types
    #[must_use]
    pub fn contains(&self, action_type: &str) -> bool {
        self.phase_of(action_type).is_some()
    }

    /// True when any action type is shared with `other`
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        [&other.request, &other.success, &other.failure]
            .into_iter()
            .any(|t| self.contains(t))
    }

    /// The action type for `phase`
    #[must_use]
    pub fn for_phase(&self, phase: Phase) -> &str {
        match phase {
            Phase::Request => &self.request,
            Phase::Success => &self.success,
            Phase::Failure => &self.failure,
        }
    }
}

/// Key under which a lifecycle's partial state is nested inside its feature area
///
/// A JSON string deserializes to [`StoreIndex::Plain`]; a JSON object to
/// [`StoreIndex::Named`], whose effective key is its `_name` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreIndex {
    /// Plain string key
    Plain(String),
    /// Structured value carrying its key in [`NAME_FIELD`]
    Named(Value),
}

impl StoreIndex {
    /// Resolve the effective key
    ///
    /// Extraction failure on a structured index is logged and yields `None`,
    /// which callers treat exactly like an absent index.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Plain(key) => Some(key.clone()),
            Self::Named(value) => match value.get(NAME_FIELD) {
                Some(Value::String(name)) => Some(name.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => {
                    tracing::error!(
                        store_index = %value,
                        "Invalid storeIndex object, expected a `{NAME_FIELD}` property"
                    );
                    None
                },
            },
        }
    }

    /// Build a structured index whose name field is `name`
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(serde_json::json!({ NAME_FIELD: name.into() }))
    }
}

impl From<&str> for StoreIndex {
    fn from(key: &str) -> Self {
        Self::Plain(key.to_string())
    }
}

impl From<String> for StoreIndex {
    fn from(key: String) -> Self {
        Self::Plain(key)
    }
}

/// An action as delivered to every feature area's dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchedAction {
    /// Action type
    #[serde(rename = "type")]
    pub action_type: String,

    /// Optional scoping key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_index: Option<StoreIndex>,

    /// Payload (`null` when absent)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,

    /// Error payload (`null` when absent)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub error: Value,

    /// Route to navigate to once this action is reduced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_route: Option<String>,

    /// Opaque caller-supplied marker forwarded on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_param: Option<String>,
}

impl DispatchedAction {
    /// A bare action of `action_type`
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            store_index: None,
            data: Value::Null,
            error: Value::Null,
            new_route: None,
            success_param: None,
        }
    }

    /// Set the scoping key
    #[must_use]
    pub fn with_store_index(mut self, index: impl Into<StoreIndex>) -> Self {
        self.store_index = Some(index.into());
        self
    }

    /// Set the scoping key from an optional value
    #[must_use]
    pub fn with_optional_store_index(mut self, index: Option<StoreIndex>) -> Self {
        self.store_index = index;
        self
    }

    /// Set the payload
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Set the error payload
    #[must_use]
    pub fn with_error(mut self, error: Value) -> Self {
        self.error = error;
        self
    }

    /// Set the navigation target
    #[must_use]
    pub fn with_route(mut self, route: Option<String>) -> Self {
        self.new_route = route;
        self
    }

    /// Set the success marker
    #[must_use]
    pub fn with_success_param(mut self, param: Option<String>) -> Self {
        self.success_param = param;
        self
    }

    /// Effective scoping key, if any
    #[must_use]
    pub fn resolved_index(&self) -> Option<String> {
        self.store_index.as_ref().and_then(StoreIndex::resolve)
    }
}
