//! # Reflux Core
//!
//! Building blocks for request/success/failure state lifecycles driven by
//! dispatched actions.
//!
//! ## Core Concepts
//!
//! - **Lifecycle**: a base name, the three action types derived from it, a
//!   reducer for those types and a runner that dispatches them
//! - **Producer**: application function that describes what a lifecycle run
//!   should dispatch (nothing, a value, a thunk or deferred work)
//! - **Feature area**: an explicit list of lifecycles sharing one state tree
//! - **Structural merge**: how a reducer's partial state lands in the tree
//! - **Environment**: the store and response parser a runner is given
//!
//! ## Flow
//!
//! ```text
//! app ──run(args)──► Runner ──dispatch──► Store ──► FeatureArea::reduce ──► merged state
//!                      │                                   │
//!                      └── deferred work settles ──────────┘ (success / failure dispatch)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use reflux_core::prelude::*;
//!
//! let fetch_cart = LifecycleBuilder::new("FETCH_CART", move |cart_id: String| {
//!     let request = client.get_cart(cart_id.clone());
//!     Ok(LifecycleParams::deferred(request).with_store_index("cart"))
//! })
//! .asynchronous()
//! .build(&env);
//!
//! let cart = FeatureArea::new("shop").with_lifecycle(fetch_cart.registration());
//! store.mount(cart);
//!
//! let payload = fetch_cart.run("c-42".to_string()).await?;
//! ```

pub mod action;
pub mod area;
pub mod effect;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod reducer;
pub mod state;
pub mod transition;

pub use serde_json::{Value, json};
pub use smallvec::{SmallVec, smallvec};

/// Commonly used types
pub mod prelude {
    pub use crate::action::{ActionTypes, DispatchedAction, Flavor, Phase, StoreIndex};
    pub use crate::area::{FeatureArea, Reduction};
    pub use crate::effect::Effect;
    pub use crate::environment::{
        EnvelopeParser, Environment, Navigator, NoopNavigator, ParsedResponse, ResponseParser,
        Store,
    };
    pub use crate::error::{LifecycleError, ReducerError};
    pub use crate::lifecycle::{
        ActionData, Lifecycle, LifecycleBuilder, LifecycleParams, RegisteredLifecycle, Runner,
    };
    pub use crate::reducer::{LifecycleReducer, Overrides, Reducer};
    pub use crate::state::{LifecycleState, StatePath};
}
