//! # Demo Cart Seeder
//!
//! Writes a demo cart snapshot into a SQLite database for development.
//!
//! ## Usage
//! ```bash
//! # Seed 4 line items (default) into ./marketplace_dev.db
//! cargo run -p marketplace-store --bin seed
//!
//! # Custom amount / database / key
//! cargo run -p marketplace-store --bin seed -- --count 8 --db ./data/marketplace.db
//! cargo run -p marketplace-store --bin seed -- --key @GoMarketplace:products
//! ```

use std::env;

use marketplace_core::{Cart, Product, STORAGE_KEY};
use marketplace_store::{Database, DbConfig, KeyValueStore};

/// Demo catalog: (id, title, price)
const CATALOG: &[(&str, &str, f64)] = &[
    ("1", "Canvas Tote Bag", 24.9),
    ("2", "Cotton T-Shirt", 19.5),
    ("3", "Wool Beanie", 14.0),
    ("4", "Leather Wallet", 49.9),
    ("5", "Running Socks 3-Pack", 12.0),
    ("6", "Denim Jacket", 89.0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 4;
    let mut db_path = String::from("./marketplace_dev.db");
    let mut key = String::from(STORAGE_KEY);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse().unwrap_or(4);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--key" | "-k" => {
                if let Some(value) = args.get(i + 1) {
                    key = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: seed [--count N] [--db PATH] [--key KEY]");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("Seeding demo cart");
    println!("  Database: {}", db_path);
    println!("  Key:      {}", key);
    println!("  Items:    {}", count);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let kv = db.kv();

    let cart = build_cart(count);
    kv.set(&key, &cart.to_snapshot()?).await?;

    println!();
    println!(
        "✓ Wrote {} line items ({} units, subtotal {:.2})",
        cart.item_count(),
        cart.total_quantity(),
        cart.subtotal()
    );

    db.close().await;
    Ok(())
}

/// Builds a cart of `count` entries cycling through the demo catalog.
/// Every other entry gets a second unit so quantities vary.
fn build_cart(count: usize) -> Cart {
    let mut cart = Cart::new();

    for (seed, (id, title, price)) in CATALOG.iter().cycle().take(count).enumerate() {
        let product = Product::new(
            format!("{}-{}", id, seed),
            *title,
            format!("https://storage.gomarketplace.dev/products/{}.png", id),
            *price,
        );
        let line_id = product.id.clone();
        cart.add(product);
        if seed % 2 == 1 {
            cart.increment(&line_id);
        }
    }

    cart
}
