//! Page-object demonstration against the in-memory endpoint.
//!
//! Demonstrates:
//! - Declaring parts with constructors, descriptors and slots
//! - Launching an application with interceptors
//! - Driving elements inside a nested frame
//! - Following a popup surface through the registry
//!
//! Usage:
//!   cargo run --example page_objects
//!   cargo run --example page_objects -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use surface_keeper::{
    Configuration, Constructor, Descriptor, DriverKind, Field, FramePath, HandleQuery, Launcher,
    Locator, Logging, MemoryConnector, MemoryDriver, Part, Result, RetryOnRecoverable, Scope,
    Slot,
};

// ============================================================================
// Parts
// ============================================================================

/// Search form living inside the `search` frame.
struct SearchForm {
    scope: Scope,
}

impl Part for SearchForm {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::handle_frames(|scope| Ok(SearchForm { scope }))]
    }

    fn descriptor() -> Descriptor {
        Descriptor::default().with_frames(FramePath::new().name("search"))
    }
}

impl SearchForm {
    async fn search(&self, term: &str) -> Result<()> {
        self.scope.type_text(&Locator::name("q"), term).await?;
        self.scope.click(&Locator::id("go")).await
    }
}

/// Shop landing page.
struct Shop {
    scope: Scope,
    search: Slot<SearchForm>,
}

impl Part for Shop {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::handle(|scope| {
            Ok(Shop {
                scope,
                search: Slot::new(),
            })
        })]
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("search", &mut self.search)]
    }
}

/// Checkout popup.
struct Checkout {
    scope: Scope,
}

impl Part for Checkout {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::handle(|scope| Ok(Checkout { scope }))]
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "surface_keeper=debug"
    } else {
        "surface_keeper=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    println!("=== Page objects ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    let driver = MemoryDriver::new();
    driver.open_surface("main", "Shop", "https://shop.example/");
    driver.add_frame("main", &FramePath::new(), "search", None);
    let search = FramePath::new().name("search");
    let query = driver.add_element("main", &search, Locator::name("q"), "");
    let go = driver.add_element("main", &search, Locator::id("go"), "Go");

    let config = Configuration::new()
        .with_kind(DriverKind::Chrome)
        .with_handle_wait(Duration::from_secs(2));

    let shop = Launcher::new(MemoryConnector::new(driver.clone()))
        .configuration(config)
        .interceptor(Logging)
        .interceptor(RetryOnRecoverable::default())
        .launch::<Shop>()
        .await?;

    println!("[Setup] Launched on surface {}", shop.handle().surface());

    // ========================================================================
    // Search inside a frame
    // ========================================================================

    let form = shop.field(|s| &s.search)?;
    form.invoke("search", async |f: &SearchForm| f.search("lamps").await)
        .await?;

    println!(
        "[Search] Typed {:?}, clicked {} time(s)",
        driver.element_value(&query).unwrap_or_default(),
        driver.click_count(&go)
    );

    // ========================================================================
    // Popup surface
    // ========================================================================

    driver.open_surface("popup", "Checkout", "https://shop.example/cart/1");

    let checkout = shop
        .part_on::<Checkout>(&HandleQuery::new().with_title("^Checkout$")?, Duration::from_secs(2))
        .await?;
    let title = checkout
        .invoke("title", async |c: &Checkout| c.scope.handle().title().await)
        .await?;
    println!("[Popup] Found {title:?} on {}", checkout.handle().surface());

    checkout.handle().close().await?;
    let home = shop
        .invoke("title", async |s: &Shop| s.scope.handle().title().await)
        .await?;
    println!("[Popup] Closed, back on {home:?}");

    // ========================================================================
    // Teardown
    // ========================================================================

    shop.quit().await;
    println!("\n=== Done ===");
    Ok(())
}
