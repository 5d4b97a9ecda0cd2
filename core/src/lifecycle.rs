//! Lifecycle builder and runner
//!
//! A lifecycle turns a *producer* (any function of the caller's arguments that
//! describes what to do) into a request/success/failure action flow:
//!
//! ```text
//! runner.run(args)
//!     │
//!     ▼
//! producer(args) ──Err──► dispatch N_FAILURE { error: message }  ──► reject(Producer)
//!     │
//!     ▼ LifecycleParams.action_data
//!     ├── None      ──► dispatch request { data: null }           ──► resolve(null)
//!     ├── Value     ──► dispatch request { data }                 ──► resolve(data)
//!     ├── Thunk     ──► call it, then as Value (Err as producer error)
//!     └── Deferred  ──► dispatch N_REQUEST
//!                       ... settles later ...
//!                       ├── Ok(raw), parsed status OK  ──► dispatch N_SUCCESS { data } ──► resolve(data)
//!                       ├── Ok(raw), status not OK     ──► dispatch N_FAILURE { error } ──► reject(Rejected)
//!                       └── Err(raw)                   ──► dispatch N_FAILURE { error } ──► reject(Transport)
//! ```
//!
//! # Example
//!
//! ```
//! use reflux_core::lifecycle::{LifecycleBuilder, LifecycleParams};
//!
//! let builder = LifecycleBuilder::new("SELECT_PRODUCT", |sku: String| {
//!     Ok(LifecycleParams::value(serde_json::json!({ "sku": sku })).with_store_index("selection"))
//! });
//! assert_eq!(builder.types().request, "SELECT_PRODUCT");
//! ```

use crate::action::{ActionTypes, DispatchedAction, Flavor, Phase, StoreIndex};
use crate::environment::{Environment, ResponseParser, Store};
use crate::error::{LifecycleError, ReducerError};
use crate::reducer::{LifecycleReducer, Overrides};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by [`Runner::run`]
pub type RunFuture = BoxFuture<'static, Result<Value, LifecycleError>>;

type Producer<Args> = Arc<dyn Fn(Args) -> anyhow::Result<LifecycleParams> + Send + Sync>;

/// What the producer wants dispatched
pub enum ActionData {
    /// Nothing: dispatch a request with `data: null`
    None,
    /// A ready value
    Value(Value),
    /// A value computed on demand
    Thunk(Box<dyn FnOnce() -> anyhow::Result<Value> + Send>),
    /// Work that settles later; `Err` carries the raw transport error
    Deferred(BoxFuture<'static, Result<Value, Value>>),
}

impl fmt::Debug for ActionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "ActionData::None"),
            Self::Value(value) => f.debug_tuple("ActionData::Value").field(value).finish(),
            Self::Thunk(_) => write!(f, "ActionData::Thunk(<fn>)"),
            Self::Deferred(_) => write!(f, "ActionData::Deferred(<future>)"),
        }
    }
}

/// A producer's answer
#[derive(Debug)]
pub struct LifecycleParams {
    /// Where in the feature area the result lands; the area root when `None`
    pub store_index: Option<StoreIndex>,
    /// The work to dispatch
    pub action_data: ActionData,
    /// Route to navigate to once the lifecycle completes successfully
    pub route_on_finish: Option<String>,
    /// Accepted for callers that record it; the runner does not navigate on failure
    pub route_on_error: Option<String>,
    /// Marker forwarded on the completing action
    pub success_param: Option<String>,
}

impl LifecycleParams {
    /// Params for `action_data` with nothing else set
    #[must_use]
    pub const fn new(action_data: ActionData) -> Self {
        Self {
            store_index: None,
            action_data,
            route_on_finish: None,
            route_on_error: None,
            success_param: None,
        }
    }

    /// No data at all
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(ActionData::None)
    }

    /// A ready value
    #[must_use]
    pub const fn value(value: Value) -> Self {
        Self::new(ActionData::Value(value))
    }

    /// A value computed when the runner handles the params
    #[must_use]
    pub fn thunk<F>(thunk: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<Value> + Send + 'static,
    {
        Self::new(ActionData::Thunk(Box::new(thunk)))
    }

    /// A deferred computation
    #[must_use]
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, Value>> + Send + 'static,
    {
        Self::new(ActionData::Deferred(future.boxed()))
    }

    /// Scope the result under `index`
    #[must_use]
    pub fn with_store_index(mut self, index: impl Into<StoreIndex>) -> Self {
        self.store_index = Some(index.into());
        self
    }

    /// Navigate to `route` on completion
    #[must_use]
    pub fn route_on_finish(mut self, route: impl Into<String>) -> Self {
        self.route_on_finish = Some(route.into());
        self
    }

    /// Record a route for failures
    #[must_use]
    pub fn route_on_error(mut self, route: impl Into<String>) -> Self {
        self.route_on_error = Some(route.into());
        self
    }

    /// Forward `param` on the completing action
    #[must_use]
    pub fn with_success_param(mut self, param: impl Into<String>) -> Self {
        self.success_param = Some(param.into());
        self
    }
}

/// Builds a [`Lifecycle`] from a base name and a producer
pub struct LifecycleBuilder<Args> {
    name: String,
    flavor: Flavor,
    producer: Producer<Args>,
    overrides: Overrides,
}

impl<Args> LifecycleBuilder<Args> {
    /// Start a synchronous lifecycle named `name`
    pub fn new<F>(name: impl AsRef<str>, producer: F) -> Self
    where
        F: Fn(Args) -> anyhow::Result<LifecycleParams> + Send + Sync + 'static,
    {
        Self {
            name: name.as_ref().to_string(),
            flavor: Flavor::Sync,
            producer: Arc::new(producer),
            overrides: Overrides::default(),
        }
    }

    /// Choose the flavor from an `is_async` flag
    #[must_use]
    pub const fn with_async(mut self, is_async: bool) -> Self {
        self.flavor = Flavor::from_async(is_async);
        self
    }

    /// Make this a tracked-loading (asynchronous) lifecycle
    #[must_use]
    pub fn asynchronous(self) -> Self {
        self.with_async(true)
    }

    /// Override the request transition
    #[must_use]
    pub fn on_request<F>(mut self, reducer: F) -> Self
    where
        F: Fn(&Value, &DispatchedAction) -> Result<Value, ReducerError> + Send + Sync + 'static,
    {
        self.overrides.request = Some(Arc::new(reducer));
        self
    }

    /// Override the success transition
    #[must_use]
    pub fn on_success<F>(mut self, reducer: F) -> Self
    where
        F: Fn(&Value, &DispatchedAction) -> Result<Value, ReducerError> + Send + Sync + 'static,
    {
        self.overrides.success = Some(Arc::new(reducer));
        self
    }

    /// Override the failure transition
    #[must_use]
    pub fn on_failure<F>(mut self, reducer: F) -> Self
    where
        F: Fn(&Value, &DispatchedAction) -> Result<Value, ReducerError> + Send + Sync + 'static,
    {
        self.overrides.failure = Some(Arc::new(reducer));
        self
    }

    /// Replace all overrides at once, e.g. with shared [`Reducer`](crate::reducer::Reducer) objects
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The action types the lifecycle will use
    #[must_use]
    pub fn types(&self) -> ActionTypes {
        ActionTypes::derive(&self.name, self.flavor)
    }

    /// Build the reducer and the runner, closing over `env`
    #[must_use]
    pub fn build(self, env: &Environment) -> Lifecycle<Args> {
        let types = self.types();
        let reducer = Arc::new(LifecycleReducer::new(types.clone(), self.overrides));

        Lifecycle {
            registration: RegisteredLifecycle {
                types: types.clone(),
                reducer,
            },
            runner: Runner {
                types,
                producer: self.producer,
                env: env.clone(),
            },
        }
    }
}

impl<Args> fmt::Debug for LifecycleBuilder<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleBuilder")
            .field("name", &self.name)
            .field("flavor", &self.flavor)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

/// A lifecycle's action types bound to its reducer
///
/// This is what a [`FeatureArea`](crate::area::FeatureArea) holds.
#[derive(Debug, Clone)]
pub struct RegisteredLifecycle {
    types: ActionTypes,
    reducer: Arc<LifecycleReducer>,
}

impl RegisteredLifecycle {
    /// Register a reducer that was built without a runner
    #[must_use]
    pub fn new(reducer: LifecycleReducer) -> Self {
        Self {
            types: reducer.types().clone(),
            reducer: Arc::new(reducer),
        }
    }

    /// The action types
    #[must_use]
    pub const fn types(&self) -> &ActionTypes {
        &self.types
    }

    /// The reducer
    #[must_use]
    pub fn reducer(&self) -> &LifecycleReducer {
        &self.reducer
    }
}

/// A built lifecycle: registration for the dispatcher plus a runner for callers
pub struct Lifecycle<Args> {
    registration: RegisteredLifecycle,
    runner: Runner<Args>,
}

impl<Args> Lifecycle<Args> {
    /// The action types
    #[must_use]
    pub const fn types(&self) -> &ActionTypes {
        &self.registration.types
    }

    /// A registration to hand to a feature area
    #[must_use]
    pub fn registration(&self) -> RegisteredLifecycle {
        self.registration.clone()
    }

    /// The runner
    #[must_use]
    pub const fn runner(&self) -> &Runner<Args> {
        &self.runner
    }

    /// Run the lifecycle; see [`Runner::run`]
    pub fn run(&self, args: Args) -> RunFuture {
        self.runner.run(args)
    }
}

impl<Args> fmt::Debug for Lifecycle<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

/// The callable application code uses to start a lifecycle
pub struct Runner<Args> {
    types: ActionTypes,
    producer: Producer<Args>,
    env: Environment,
}

impl<Args> Clone for Runner<Args> {
    fn clone(&self) -> Self {
        Self {
            types: self.types.clone(),
            producer: Arc::clone(&self.producer),
            env: self.env.clone(),
        }
    }
}

impl<Args> fmt::Debug for Runner<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("types", &self.types)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl<Args> Runner<Args> {
    /// Run the producer and dispatch the resulting actions
    ///
    /// The producer call and the request (or early failure) dispatch happen
    /// before this returns. Deferred work is spawned onto the current tokio
    /// runtime, so it settles and dispatches even if the returned future is
    /// dropped. Outside a runtime the settlement runs when the future is polled.
    ///
    /// # Errors
    ///
    /// The returned future resolves to:
    /// - [`LifecycleError::Producer`] if the producer or its thunk failed
    /// - [`LifecycleError::Transport`] if the deferred computation rejected
    /// - [`LifecycleError::Rejected`] if the parsed response reported a
    ///   non-success status
    #[tracing::instrument(skip_all, fields(lifecycle = %self.types.request))]
    pub fn run(&self, args: Args) -> RunFuture {
        let params = match (self.producer)(args) {
            Ok(params) => params,
            Err(error) => return self.reject_early(None, error),
        };

        let LifecycleParams {
            store_index,
            action_data,
            route_on_finish,
            route_on_error: _,
            success_param,
        } = params;

        let store_index = store_index.filter(|index| !is_blank(index));

        match action_data {
            ActionData::None => self.complete(store_index, Value::Null, route_on_finish, success_param),
            ActionData::Value(value) => self.complete(store_index, value, route_on_finish, success_param),
            ActionData::Thunk(thunk) => match thunk() {
                Ok(value) => self.complete(store_index, value, route_on_finish, success_param),
                Err(error) => self.reject_early(store_index, error),
            },
            ActionData::Deferred(deferred) => {
                self.env.store.dispatch(
                    DispatchedAction::new(self.types.for_phase(Phase::Request))
                        .with_optional_store_index(store_index.clone()),
                );

                let settlement = Settlement {
                    types: self.types.clone(),
                    store: Arc::clone(&self.env.store),
                    parser: self.env.parser.clone(),
                    store_index,
                    route_on_finish,
                    success_param,
                };

                spawn_settlement(settlement.settle(deferred))
            },
        }
    }

    fn complete(
        &self,
        store_index: Option<StoreIndex>,
        value: Value,
        route_on_finish: Option<String>,
        success_param: Option<String>,
    ) -> RunFuture {
        self.env.store.dispatch(
            DispatchedAction::new(self.types.for_phase(Phase::Request))
                .with_optional_store_index(store_index)
                .with_route(route_on_finish)
                .with_success_param(success_param)
                .with_data(value.clone()),
        );

        futures::future::ready(Ok(value)).boxed()
    }

    fn reject_early(&self, store_index: Option<StoreIndex>, error: anyhow::Error) -> RunFuture {
        tracing::error!(error = %error, "Lifecycle producer failed");

        self.env.store.dispatch(
            DispatchedAction::new(self.types.for_phase(Phase::Failure))
                .with_optional_store_index(store_index)
                .with_error(Value::String(error.to_string())),
        );

        futures::future::ready(Err(LifecycleError::Producer(error))).boxed()
    }
}

fn is_blank(index: &StoreIndex) -> bool {
    matches!(index, StoreIndex::Plain(key) if key.is_empty())
}

fn spawn_settlement<F>(settle: F) -> RunFuture
where
    F: Future<Output = Result<Value, LifecycleError>> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let (tx, rx) = tokio::sync::oneshot::channel();
            handle.spawn(async move {
                // The caller may have stopped listening
                let _ = tx.send(settle.await);
            });
            async move { rx.await.unwrap_or_else(|_| Err(LifecycleError::Abandoned)) }.boxed()
        },
        Err(_) => {
            tracing::debug!("No tokio runtime, settlement runs when the result is awaited");
            settle.boxed()
        },
    }
}

/// Everything the deferred branch needs after `run` has returned
struct Settlement {
    types: ActionTypes,
    store: Arc<dyn Store>,
    parser: Option<Arc<dyn ResponseParser>>,
    store_index: Option<StoreIndex>,
    route_on_finish: Option<String>,
    success_param: Option<String>,
}

impl Settlement {
    async fn settle(
        self,
        deferred: BoxFuture<'static, Result<Value, Value>>,
    ) -> Result<Value, LifecycleError> {
        let raw = match deferred.await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(error = %error, "Deferred computation rejected");
                self.fail(error.clone(), Value::Null);
                return Err(LifecycleError::Transport(error));
            },
        };

        let Some(parser) = &self.parser else {
            self.succeed(raw.clone());
            return Ok(raw);
        };

        let parsed = parser.parse(&raw);
        if parsed.is_success() {
            self.succeed(parsed.response_data.clone());
            Ok(parsed.response_data)
        } else {
            let exception = parsed.exception();
            tracing::warn!(
                status = parsed.status(),
                exception = %exception,
                "Service reported failure"
            );
            let envelope = serde_json::to_value(&parsed).unwrap_or(Value::Null);
            self.fail(exception.clone(), envelope);
            Err(LifecycleError::Rejected(exception))
        }
    }

    fn succeed(&self, data: Value) {
        self.store.dispatch(
            DispatchedAction::new(self.types.for_phase(Phase::Success))
                .with_optional_store_index(self.store_index.clone())
                .with_route(self.route_on_finish.clone())
                .with_success_param(self.success_param.clone())
                .with_data(data),
        );
    }

    fn fail(&self, error: Value, data: Value) {
        self.store.dispatch(
            DispatchedAction::new(self.types.for_phase(Phase::Failure))
                .with_optional_store_index(self.store_index.clone())
                .with_data(data)
                .with_error(error),
        );
    }
}
