//! # Cart Demo
//!
//! A shopping cart feature area wired end to end on Reflux.
//!
//! This example showcases:
//! - Asynchronous lifecycles backed by a (simulated) remote service
//! - A synchronous lifecycle for UI state
//! - A success override that derives extra state from the payload
//! - A producer that refuses to run by reading current store state
//! - Navigation once a lifecycle completes
//!
//! ## State layout
//!
//! ```text
//! cart
//! ├── cart      { data: Cart, loading, error, itemCount }   FETCH_CART, ADD_ITEM
//! ├── filter    { data: "<text>" }                          SET_FILTER
//! └── checkout  { data: { orderId }, loading, error }       CHECKOUT
//! ```

use futures::future::BoxFuture;
use reflux_core::action::DispatchedAction;
use reflux_core::area::FeatureArea;
use reflux_core::environment::{Environment, Store};
use reflux_core::error::ReducerError;
use reflux_core::lifecycle::{Lifecycle, LifecycleBuilder, LifecycleParams};
use reflux_core::state::StatePath;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Name of the feature area in the root state
pub const AREA: &str = "cart";

/// Route shown once a cart is loaded
pub const CART_ROUTE: &str = "/cart";

/// Route shown once an order is placed
pub const THANKS_ROUTE: &str = "/thanks";

/// One line of a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Stock keeping unit
    pub sku: String,
    /// Units ordered
    pub quantity: u32,
}

impl CartItem {
    /// `quantity` units of `sku`
    #[must_use]
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// A cart as the service returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart identifier
    pub id: String,
    /// Lines in insertion order
    pub items: Vec<CartItem>,
}

/// The remote cart service
///
/// Every call resolves with a `{statusData, responseData}` envelope or
/// rejects with a raw transport error.
pub trait CartService: Send + Sync {
    /// Load a cart
    fn fetch(&self, cart_id: &str) -> BoxFuture<'static, Result<Value, Value>>;

    /// Add `item` to a cart, answering with the updated cart
    fn add_item(&self, cart_id: &str, item: CartItem) -> BoxFuture<'static, Result<Value, Value>>;

    /// Turn a cart into an order, answering with `{orderId}`
    fn checkout(&self, cart_id: &str) -> BoxFuture<'static, Result<Value, Value>>;
}

fn ok_envelope(payload: Value) -> Value {
    json!({
        "statusData": { "Response": { "Status": "OK" } },
        "responseData": payload
    })
}

fn error_envelope(status: &str, exception: String) -> Value {
    json!({
        "statusData": { "Response": { "Status": status, "Exception": exception } },
        "responseData": null
    })
}

type Carts = Arc<Mutex<HashMap<String, Vec<CartItem>>>>;

/// In-memory [`CartService`] with configurable latency and outages
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    carts: Carts,
    latency: Duration,
    offline: Arc<AtomicBool>,
    orders: Arc<AtomicU64>,
}

impl InMemoryCartService {
    /// Service with no carts and no latency
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Create an empty cart
    pub fn open_cart(&self, cart_id: impl Into<String>) {
        self.carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cart_id.into(), Vec::new());
    }

    /// Simulate a network outage; calls reject until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    fn call<F>(&self, answer: F) -> BoxFuture<'static, Result<Value, Value>>
    where
        F: FnOnce(&mut HashMap<String, Vec<CartItem>>) -> Value + Send + 'static,
    {
        let carts = Arc::clone(&self.carts);
        let offline = Arc::clone(&self.offline);
        let latency = self.latency;

        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if offline.load(Ordering::Acquire) {
                return Err(json!({ "status": 503, "message": "cart service unavailable" }));
            }
            let mut carts = carts.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(answer(&mut carts))
        })
    }
}

fn cart_json(cart_id: &str, items: &[CartItem]) -> Value {
    json!({ "id": cart_id, "items": items })
}

impl CartService for InMemoryCartService {
    fn fetch(&self, cart_id: &str) -> BoxFuture<'static, Result<Value, Value>> {
        let cart_id = cart_id.to_string();
        self.call(move |carts| match carts.get(&cart_id) {
            Some(items) => ok_envelope(cart_json(&cart_id, items)),
            None => error_envelope("NOT_FOUND", format!("Unknown cart {cart_id}")),
        })
    }

    fn add_item(&self, cart_id: &str, item: CartItem) -> BoxFuture<'static, Result<Value, Value>> {
        let cart_id = cart_id.to_string();
        self.call(move |carts| match carts.get_mut(&cart_id) {
            Some(items) => {
                match items.iter_mut().find(|line| line.sku == item.sku) {
                    Some(line) => line.quantity += item.quantity,
                    None => items.push(item),
                }
                ok_envelope(cart_json(&cart_id, items))
            },
            None => error_envelope("NOT_FOUND", format!("Unknown cart {cart_id}")),
        })
    }

    fn checkout(&self, cart_id: &str) -> BoxFuture<'static, Result<Value, Value>> {
        let cart_id = cart_id.to_string();
        let orders = Arc::clone(&self.orders);
        self.call(move |carts| match carts.get_mut(&cart_id) {
            Some(items) if !items.is_empty() => {
                items.clear();
                let number = orders.fetch_add(1, Ordering::AcqRel) + 1;
                ok_envelope(json!({ "orderId": format!("order-{number}") }))
            },
            Some(_) => error_envelope("EMPTY_CART", format!("Cart {cart_id} is empty")),
            None => error_envelope("NOT_FOUND", format!("Unknown cart {cart_id}")),
        })
    }
}

/// Success override for lifecycles answering with a cart: adds `itemCount`
///
/// # Errors
///
/// Returns [`ReducerError`] if the payload is not a cart.
pub fn summarize_cart(_state: &Value, action: &DispatchedAction) -> Result<Value, ReducerError> {
    let cart: Cart = serde_json::from_value(action.data.clone())?;
    let item_count: u32 = cart.items.iter().map(|line| line.quantity).sum();

    Ok(json!({
        "data": action.data,
        "loading": false,
        "itemCount": item_count
    }))
}

/// All lifecycles of the cart area
pub struct CartLifecycles {
    /// Load a cart by id
    pub fetch_cart: Lifecycle<String>,
    /// Add an item to a cart
    pub add_item: Lifecycle<(String, CartItem)>,
    /// Set the product filter (UI state only)
    pub set_filter: Lifecycle<String>,
    /// Place an order for a cart
    pub checkout: Lifecycle<String>,
}

impl CartLifecycles {
    /// Build every lifecycle against `env`, calling `service` for remote work
    #[must_use]
    pub fn build(env: &Environment, service: &Arc<dyn CartService>) -> Self {
        let fetch_cart = {
            let service = Arc::clone(service);
            LifecycleBuilder::new("FETCH_CART", move |cart_id: String| {
                Ok(LifecycleParams::deferred(service.fetch(&cart_id))
                    .with_store_index("cart")
                    .route_on_finish(CART_ROUTE))
            })
            .asynchronous()
            .on_success(summarize_cart)
            .build(env)
        };

        let add_item = {
            let service = Arc::clone(service);
            LifecycleBuilder::new("ADD_ITEM", move |(cart_id, item): (String, CartItem)| {
                tracing::debug!(cart_id = %cart_id, sku = %item.sku, "Adding item");
                Ok(LifecycleParams::deferred(service.add_item(&cart_id, item)).with_store_index("cart"))
            })
            .asynchronous()
            .on_success(summarize_cart)
            .build(env)
        };

        let set_filter = LifecycleBuilder::new("SET_FILTER", |text: String| {
            Ok(LifecycleParams::value(Value::String(text.trim().to_string())).with_store_index("filter"))
        })
        .build(env);

        let checkout = {
            let service = Arc::clone(service);
            let store = Arc::clone(&env.store);
            LifecycleBuilder::new("CHECKOUT", move |cart_id: String| {
                let items = store.get_state(&StatePath::from_segments([AREA, "cart", "data", "items"]));
                if items.as_ref().and_then(Value::as_array).is_none_or(Vec::is_empty) {
                    anyhow::bail!("Cart {cart_id} has nothing to check out");
                }
                Ok(LifecycleParams::deferred(service.checkout(&cart_id))
                    .with_store_index("checkout")
                    .route_on_finish(THANKS_ROUTE)
                    .with_success_param("order-placed"))
            })
            .asynchronous()
            .build(env)
        };

        Self {
            fetch_cart,
            add_item,
            set_filter,
            checkout,
        }
    }

    /// The feature area registering every lifecycle
    #[must_use]
    pub fn area(&self) -> FeatureArea {
        FeatureArea::new(AREA)
            .with_lifecycle(self.fetch_cart.registration())
            .with_lifecycle(self.add_item.registration())
            .with_lifecycle(self.set_filter.registration())
            .with_lifecycle(self.checkout.registration())
    }
}
