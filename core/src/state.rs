//! Lifecycle state shapes and state-tree paths
//!
//! The engine itself stores untyped JSON. [`LifecycleState`] is the typed view
//! application code decodes a lifecycle's slot into when reading the store.

use crate::action::Flavor;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// The `{data, loading, error}` value domain of one lifecycle
///
/// `loading` is only present for asynchronous lifecycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>, E: Deserialize<'de>"))]
pub struct LifecycleState<T = Value, E = Value> {
    /// Last successful payload
    #[serde(default = "Option::default")]
    pub data: Option<T>,

    /// True between request and settlement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<bool>,

    /// Last failure
    #[serde(default = "Option::default")]
    pub error: Option<E>,
}

impl<T, E> LifecycleState<T, E> {
    /// Initial state: everything null/false
    #[must_use]
    pub const fn initial(flavor: Flavor) -> Self {
        Self {
            data: None,
            loading: if flavor.is_async() { Some(false) } else { None },
            error: None,
        }
    }

    /// True while an asynchronous request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.unwrap_or(false)
    }
}

/// Untyped initial state for `flavor`
#[must_use]
pub fn initial_value(flavor: Flavor) -> Value {
    match flavor {
        Flavor::Async => json!({ "data": null, "loading": false, "error": null }),
        Flavor::Sync => json!({ "data": null, "error": null }),
    }
}

/// A path into the root state tree
///
/// Parsed from a dotted string (`"cart.items"`) or built from segments.
/// Segments that parse as integers also index into arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatePath {
    segments: Vec<String>,
}

impl StatePath {
    /// The root of the tree
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a dotted path; empty segments are skipped
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Build from explicit segments
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a segment
    #[must_use]
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// The path's segments
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Look the path up in `tree`
    #[must_use]
    pub fn lookup<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(tree, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}

impl From<&str> for StatePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<Vec<String>> for StatePath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
