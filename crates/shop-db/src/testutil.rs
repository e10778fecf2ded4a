//! Shared test fixtures: an in-memory database plus a small seeded
//! catalog (2 categories, 4 products, 2 customers) that most
//! repository and report tests build on.

use std::sync::Once;

use crate::pool::{Database, DbConfig};
use shop_core::{NewCategory, NewCustomer, NewOrder, NewOrderItem, NewProduct};

/// Identifiers of the seeded rows.
pub(crate) struct Fixture {
    pub electronics: i64,
    pub books: i64,
    pub laptop: i64,
    pub phone: i64,
    pub novel: i64,
    pub atlas: i64,
    pub alice: i64,
    pub bob: i64,
}

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    init_tracing();
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Installs a fmt subscriber once per process so `RUST_LOG=debug cargo
/// test` shows operation traces. The sink stays owned by the test
/// harness, exactly as an embedder would own it.
fn init_tracing() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Seeds the standard catalog and returns the assigned ids.
pub(crate) async fn seed_catalog(db: &Database) -> Fixture {
    let electronics = db
        .categories()
        .create(&NewCategory::new("Electronics").description("Devices and gadgets"))
        .await
        .expect("seed category");
    let books = db
        .categories()
        .create(&NewCategory::new("Books"))
        .await
        .expect("seed category");

    let laptop = db
        .products()
        .create(&NewProduct::new("Laptop", 999.99, electronics).stock_quantity(5))
        .await
        .expect("seed product");
    let phone = db
        .products()
        .create(&NewProduct::new("Phone", 299.99, electronics).stock_quantity(10))
        .await
        .expect("seed product");
    let novel = db
        .products()
        .create(
            &NewProduct::new("Novel", 12.99, books)
                .description("A paperback classic")
                .stock_quantity(50),
        )
        .await
        .expect("seed product");
    let atlas = db
        .products()
        .create(&NewProduct::new("Atlas", 49.90, books).stock_quantity(7))
        .await
        .expect("seed product");

    let alice = db
        .customers()
        .create(&NewCustomer::new("Alice", "Archer", "alice@example.com"))
        .await
        .expect("seed customer");
    let bob = db
        .customers()
        .create(&NewCustomer::new("Bob", "Baker", "bob@example.com").phone("555-0100"))
        .await
        .expect("seed customer");

    Fixture {
        electronics,
        books,
        laptop,
        phone,
        novel,
        atlas,
        alice,
        bob,
    }
}

/// Creates an order for `customer` with the given
/// `(product_id, quantity, unit_price)` lines.
pub(crate) async fn place_order(db: &Database, customer: i64, lines: &[(i64, i64, f64)]) -> i64 {
    let order = db
        .orders()
        .create(&NewOrder::new(customer))
        .await
        .expect("seed order");
    for (product, quantity, unit_price) in lines {
        db.orders()
            .add_item(&NewOrderItem::new(order, *product, *quantity, *unit_price))
            .await
            .expect("seed order item");
    }
    order
}
