//! Cart demo binary
//!
//! Walks a cart through loading, adding items, a failed request and checkout,
//! printing the cart area after each step.

use cart_demo::{AREA, CartItem, CartLifecycles, CartService, InMemoryCartService};
use reflux_core::environment::{EnvelopeParser, Environment, Navigator};
use reflux_runtime::{RootStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Router stand-in that logs route changes
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate_by_url(&self, path: &str) {
        println!("    ↪ navigate to {path}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cart_demo=debug,reflux_runtime=info,reflux_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Cart Demo: Reflux lifecycles ===\n");

    let config = StoreConfig::from_env()?;
    let store = Arc::new(RootStore::with_config(Arc::new(ConsoleNavigator), config));
    let env = Environment::new(store.clone(), Arc::new(EnvelopeParser));

    let memory = InMemoryCartService::new().with_latency(Duration::from_millis(50));
    memory.open_cart("c-1");
    let service: Arc<dyn CartService> = Arc::new(memory.clone());

    let cart = CartLifecycles::build(&env, &service);
    store.mount(cart.area())?;

    let mut actions = store.subscribe_actions();
    tokio::spawn(async move {
        while let Ok(action) = actions.recv().await {
            println!("    · {}", action.action_type);
        }
    });

    println!(">>> Checkout an empty cart");
    if let Err(error) = cart.checkout.run("c-1".to_string()).await {
        println!("    rejected: {error}");
    }
    print_area(&store);

    println!("\n>>> Fetch cart c-1");
    cart.fetch_cart.run("c-1".to_string()).await?;
    print_area(&store);

    println!("\n>>> Add two apples and a pear");
    cart.add_item
        .run(("c-1".to_string(), CartItem::new("apple", 2)))
        .await?;
    cart.add_item
        .run(("c-1".to_string(), CartItem::new("pear", 1)))
        .await?;
    print_area(&store);

    println!("\n>>> Filter products");
    cart.set_filter.run("  fruit ".to_string()).await?;
    print_area(&store);

    println!("\n>>> Fetch an unknown cart");
    if let Err(error) = cart.fetch_cart.run("c-404".to_string()).await {
        println!("    rejected: {error}");
    }
    print_area(&store);

    println!("\n>>> Add while the service is offline");
    memory.set_offline(true);
    if let Err(error) = cart
        .add_item
        .run(("c-1".to_string(), CartItem::new("plum", 1)))
        .await
    {
        println!("    rejected: {error}");
    }
    memory.set_offline(false);
    print_area(&store);

    println!("\n>>> Fetch again, then check out");
    cart.fetch_cart.run("c-1".to_string()).await?;
    let order = cart.checkout.run("c-1".to_string()).await?;
    println!("    order: {order}");
    print_area(&store);

    store.shutdown();
    println!("\n=== Demo complete ===");
    Ok(())
}

fn print_area(store: &RootStore) {
    let root = store.snapshot();
    let area = root.get(AREA).cloned().unwrap_or_default();
    match serde_json::to_string_pretty(&area) {
        Ok(pretty) => println!("    {AREA} = {}", pretty.replace('\n', "\n    ")),
        Err(error) => tracing::warn!(error = %error, "Could not render state"),
    }
}
