//! # Reflux Runtime
//!
//! The root store that hosts feature areas.
//!
//! [`RootStore`] implements the [`Store`] collaborator lifecycles dispatch
//! into. It owns one state slot per mounted [`FeatureArea`] and, for every
//! dispatched action:
//!
//! 1. runs each area's dispatcher on its slot, under one lock, in mount order,
//! 2. publishes a new root snapshot if any slot changed,
//! 3. executes the collected effects (navigation) outside the lock,
//! 4. broadcasts the action to [`subscribe_actions`](RootStore::subscribe_actions)
//!    receivers.
//!
//! ## Example
//!
//! ```ignore
//! use reflux_runtime::RootStore;
//! use reflux_core::prelude::*;
//!
//! let store = Arc::new(RootStore::new(Arc::new(router)));
//! let env = Environment::new(store.clone(), Arc::new(EnvelopeParser));
//!
//! let fetch_cart = fetch_cart_builder().build(&env);
//! store.mount(FeatureArea::new("shop").with_lifecycle(fetch_cart.registration()))?;
//!
//! fetch_cart.run(cart_id).await?;
//! let cart: Option<LifecycleState<Cart>> = store.get_state_as("shop.cart")?;
//! ```

use futures::StreamExt;
use futures::stream::BoxStream;
use reflux_core::action::DispatchedAction;
use reflux_core::area::FeatureArea;
use reflux_core::effect::Effect;
use reflux_core::environment::{Navigator, Store};
use reflux_core::state::StatePath;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{broadcast, watch};

/// Store configuration
pub mod config;

/// Metric names and descriptions
pub mod telemetry;

pub use config::{ConfigError, StoreConfig};

/// Error types for the root store
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during root store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shut down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// A feature area with this name is already mounted
        #[error("Feature area already mounted: {0}")]
        DuplicateArea(String),

        /// State at the requested path did not decode into the requested type
        #[error("Failed to decode state: {0}")]
        Decode(#[from] serde_json::Error),
    }
}

pub use error::StoreError;

/// One mounted feature area and its state slot
#[derive(Debug)]
struct Slot {
    area: FeatureArea,
    state: Arc<Value>,
}

/// Root store hosting any number of feature areas
///
/// Dispatch is synchronous and serialized: when [`dispatch`](Store::dispatch)
/// returns, every area has reduced the action and any navigation it requested
/// has run.
pub struct RootStore {
    slots: Mutex<Vec<Slot>>,
    state: watch::Sender<Arc<Value>>,
    navigator: Arc<dyn Navigator>,
    action_broadcast: broadcast::Sender<DispatchedAction>,
    shutdown: AtomicBool,
    config: StoreConfig,
}

impl RootStore {
    /// Create an empty store with default configuration
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self::with_config(navigator, StoreConfig::default())
    }

    /// Create an empty store with `config`
    ///
    /// A zero broadcast capacity is raised to one.
    #[must_use]
    pub fn with_config(navigator: Arc<dyn Navigator>, config: StoreConfig) -> Self {
        let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let (state, _) = watch::channel(Arc::new(json!({})));

        Self {
            slots: Mutex::new(Vec::new()),
            state,
            navigator,
            action_broadcast,
            shutdown: AtomicBool::new(false),
            config,
        }
    }

    /// The configuration this store was built with
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Mount `area` under its name; its slot starts as `{}`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateArea`] if an area with the same name is
    /// already mounted.
    pub fn mount(&self, area: FeatureArea) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        if slots.iter().any(|slot| slot.area.name() == area.name()) {
            tracing::warn!(area = %area.name(), "Rejected mount: area name already taken");
            return Err(StoreError::DuplicateArea(area.name().to_string()));
        }

        tracing::debug!(
            area = %area.name(),
            lifecycles = area.lifecycles().len(),
            "Mounting feature area"
        );

        slots.push(Slot {
            area,
            state: Arc::new(json!({})),
        });
        self.publish(&slots);
        Ok(())
    }

    /// Names of the mounted areas, in mount order
    #[must_use]
    pub fn areas(&self) -> Vec<String> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|slot| slot.area.name().to_string())
            .collect()
    }

    /// Dispatch `action` to every mounted area
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    #[tracing::instrument(
        skip(self, action),
        fields(action_type = %action.action_type),
        name = "store_dispatch"
    )]
    pub fn try_dispatch(&self, action: DispatchedAction) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            metrics::counter!(telemetry::DISPATCH_REJECTED).increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        tracing::debug!("Processing action");
        metrics::counter!(telemetry::DISPATCH_TOTAL).increment(1);

        let mut effects: Vec<Effect> = Vec::new();
        let mut matched = false;

        {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let mut changed = false;

            for slot in slots.iter_mut() {
                let start = Instant::now();
                let reduction = slot.area.reduce(&slot.state, &action);
                metrics::histogram!(telemetry::REDUCER_DURATION, "area" => slot.area.name().to_string())
                    .record(start.elapsed().as_secs_f64());

                matched |= reduction.matched;
                if !Arc::ptr_eq(&slot.state, &reduction.state) {
                    slot.state = reduction.state;
                    changed = true;
                }
                effects.extend(reduction.effects);
            }

            if changed {
                self.publish(&slots);
            }
        }

        if !matched {
            tracing::trace!("No feature area handled the action");
            metrics::counter!(telemetry::DISPATCH_UNMATCHED).increment(1);
        }

        for effect in &effects {
            if matches!(effect, Effect::Navigate { .. }) {
                metrics::counter!(telemetry::NAVIGATION_TOTAL).increment(1);
            }
            effect.execute(self.navigator.as_ref());
        }

        // No receivers is fine
        let _ = self.action_broadcast.send(action);

        Ok(())
    }

    fn publish(&self, slots: &[Slot]) {
        let root: Map<String, Value> = slots
            .iter()
            .map(|slot| (slot.area.name().to_string(), slot.state.as_ref().clone()))
            .collect();
        let root = Arc::new(Value::Object(root));

        if self.config.log_state_changes {
            tracing::debug!(state = %root, "Root state changed");
        }

        self.state.send_replace(root);
    }

    /// The current root state
    #[must_use]
    pub fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&*self.state.borrow())
    }

    /// Current value at `path`, decoded into `T`
    ///
    /// ```ignore
    /// let cart: Option<LifecycleState<Cart>> = store.get_state_as("shop.cart")?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the value exists but does not decode.
    pub fn get_state_as<T: DeserializeOwned>(
        &self,
        path: impl Into<StatePath>,
    ) -> Result<Option<T>, StoreError> {
        let path = path.into();
        self.get_state(&path)
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Subscribe to every successfully dispatched action
    ///
    /// Slow receivers observe [`broadcast::error::RecvError::Lagged`] once
    /// more than `broadcast_capacity` actions are buffered.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<DispatchedAction> {
        self.action_broadcast.subscribe()
    }

    /// Stop accepting actions
    ///
    /// Deferred lifecycle work still settling afterwards has its success or
    /// failure dispatch rejected.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down root store");
        self.shutdown.store(true, Ordering::Release);
    }

    /// True once [`shutdown`](Self::shutdown) was called
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Store for RootStore {
    fn dispatch(&self, action: DispatchedAction) {
        // Rejections are logged by try_dispatch
        let _ = self.try_dispatch(action);
    }

    fn get_state(&self, path: &StatePath) -> Option<Value> {
        path.lookup(&self.state.borrow()).cloned()
    }

    /// Emits the current value first, then each value that differs from the
    /// previous emission. Absent paths read as `null`. Intermediate states
    /// published faster than the consumer polls may be skipped.
    fn select(&self, path: &StatePath) -> BoxStream<'static, Value> {
        let mut rx = self.state.subscribe();
        let path = path.clone();

        async_stream::stream! {
            let mut last: Option<Value> = None;
            loop {
                let current = {
                    let root = rx.borrow_and_update();
                    path.lookup(&root).cloned().unwrap_or(Value::Null)
                };

                if last.as_ref() != Some(&current) {
                    last = Some(current.clone());
                    yield current;
                }

                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for RootStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootStore")
            .field("areas", &self.areas())
            .field("config", &self.config)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reflux_core::action::{ActionTypes, Flavor};
    use reflux_core::lifecycle::RegisteredLifecycle;
    use reflux_core::reducer::{LifecycleReducer, Overrides};
    use reflux_testing::mocks::RecordingNavigator;

    fn area(name: &str, lifecycle: &str, flavor: Flavor) -> FeatureArea {
        FeatureArea::new(name).with_lifecycle(RegisteredLifecycle::new(LifecycleReducer::new(
            ActionTypes::derive(lifecycle, flavor),
            Overrides::default(),
        )))
    }

    fn store() -> (RootStore, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let store = RootStore::new(navigator.clone());
        (store, navigator)
    }

    #[test]
    fn test_mounted_area_starts_empty() {
        let (store, _) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        assert_eq!(*store.snapshot(), json!({ "shop": {} }));
        assert_eq!(store.areas(), ["shop"]);
    }

    #[test]
    fn test_duplicate_area_name_is_rejected() {
        let (store, _) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        let error = store.mount(area("shop", "SAVE", Flavor::Async)).unwrap_err();
        assert!(matches!(error, StoreError::DuplicateArea(name) if name == "shop"));
    }

    #[test]
    fn test_dispatch_reduces_only_matching_area() {
        let (store, _) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        store.mount(area("prefs", "SET_THEME", Flavor::Sync)).unwrap();

        store
            .try_dispatch(DispatchedAction::new("SET_THEME").with_data(json!("dark")))
            .unwrap();

        assert_eq!(
            *store.snapshot(),
            json!({ "shop": {}, "prefs": { "data": "dark" } })
        );
    }

    #[test]
    fn test_unmatched_dispatch_keeps_snapshot() {
        let (store, _) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        let before = store.snapshot();

        store.try_dispatch(DispatchedAction::new("NOBODY")).unwrap();

        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_navigation_runs_once_per_matching_dispatch() {
        let (store, navigator) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        store.mount(area("other", "SAVE", Flavor::Async)).unwrap();

        store
            .try_dispatch(DispatchedAction::new("LOAD_SUCCESS").with_route(Some("/done".to_string())))
            .unwrap();

        assert_eq!(navigator.routes(), ["/done"]);
    }

    #[test]
    fn test_dispatch_after_shutdown_is_rejected() {
        let (store, _) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        store.shutdown();

        let error = store.try_dispatch(DispatchedAction::new("LOAD_REQUEST")).unwrap_err();

        assert!(matches!(error, StoreError::ShutdownInProgress));
        assert_eq!(*store.snapshot(), json!({ "shop": {} }));
    }

    #[test]
    fn test_get_state_as_decodes_lifecycle_state() {
        use reflux_core::state::LifecycleState;

        let (store, _) = store();
        store.mount(area("shop", "LOAD", Flavor::Async)).unwrap();
        store
            .try_dispatch(
                DispatchedAction::new("LOAD_SUCCESS")
                    .with_store_index("count")
                    .with_data(json!(3)),
            )
            .unwrap();

        let state: LifecycleState<u32> = store.get_state_as("shop.count").unwrap().unwrap();
        assert_eq!(state.data, Some(3));
        assert_eq!(state.loading, Some(false));

        let missing: Option<LifecycleState<u32>> = store.get_state_as("shop.nothing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_get_state_as_reports_decode_errors() {
        let (store, _) = store();
        store.mount(area("prefs", "SET_THEME", Flavor::Sync)).unwrap();
        store
            .try_dispatch(DispatchedAction::new("SET_THEME").with_data(json!("dark")))
            .unwrap();

        let result: Result<Option<u32>, _> = store.get_state_as("prefs.data");
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
