//! # Cart Control
//!
//! Inspects and edits the persisted cart from the command line, going
//! through the same `CartStore` the app uses.
//!
//! ## Usage
//! ```bash
//! cargo run -p marketplace-cart --bin cartctl -- list
//! cargo run -p marketplace-cart --bin cartctl -- add 7 "Linen Shirt" https://img/7.png 39.9
//! cargo run -p marketplace-cart --bin cartctl -- inc 7
//! cargo run -p marketplace-cart --bin cartctl -- --db ./marketplace_dev.db dec 7
//! ```
//!
//! Config comes from `cart.toml` and `MARKETPLACE_*` variables; `--config`
//! and `--db` override them.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use marketplace_cart::{CartConfig, CartStore, KeyValueStore, Product};
use marketplace_store::{Database, DbConfig};

const USAGE: &str = "Usage: cartctl [--config PATH] [--db PATH] <command>

Commands:
  list                                  Show the cart
  add <id> <title> <image_url> <price>  Append a product
  inc <id>                              Add one unit
  dec <id>                              Remove one unit";

enum Command {
    List,
    Add(Product),
    Increment(String),
    Decrement(String),
}

/// Parsed command line.
struct Invocation {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let Invocation {
        config_path,
        db_path,
        command,
    } = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };

    let mut config = CartConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.storage.database_path = Some(path);
    }
    init_tracing(&config.logging.filter);

    let database_path = config.database_path()?;
    info!(path = ?database_path, key = %config.key(), "Opening cart");

    let db = Database::new(DbConfig::new(&database_path)).await?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(db.kv());
    let cart = CartStore::open(kv, config.key()).await;

    match command {
        Command::List => {}
        Command::Add(product) => cart.add_to_cart(product).await?,
        Command::Increment(id) => cart.increment(&id).await?,
        Command::Decrement(id) => cart.decrement(&id).await?,
    }

    print_cart(&cart);
    db.close().await;
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut rest: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = Some(flag_value(arg, iter.next())?),
            "--db" | "-d" => db_path = Some(flag_value(arg, iter.next())?),
            other => rest.push(other.to_string()),
        }
    }

    Ok(Invocation {
        config_path,
        db_path,
        command: parse_command(&rest)?,
    })
}

fn flag_value(flag: &str, value: Option<&String>) -> Result<PathBuf, String> {
    match value {
        Some(value) if !value.starts_with('-') => Ok(PathBuf::from(value)),
        _ => Err(format!("{} requires a value", flag)),
    }
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    match args {
        [cmd] if cmd == "list" => Ok(Command::List),
        [cmd, id, title, image_url, price] if cmd == "add" => {
            let price: f64 = price
                .parse()
                .map_err(|_| format!("Invalid price: {}", price))?;
            Ok(Command::Add(Product::new(
                id.as_str(),
                title.as_str(),
                image_url.as_str(),
                price,
            )))
        }
        [cmd, id] if cmd == "inc" => Ok(Command::Increment(id.clone())),
        [cmd, id] if cmd == "dec" => Ok(Command::Decrement(id.clone())),
        [] => Err("Missing command".to_string()),
        other => Err(format!("Unrecognized command: {}", other.join(" "))),
    }
}

fn print_cart(cart: &CartStore) {
    let items = cart.products();
    if items.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in &items {
        println!(
            "{:<8} {:<28} {:>4} x {:>8.2} = {:>9.2}",
            item.id,
            item.title,
            item.quantity,
            item.price,
            item.line_total()
        );
    }

    let totals = cart.totals();
    println!(
        "{} items, {} units, subtotal {:.2}",
        totals.item_count, totals.total_quantity, totals.subtotal
    );
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_and_command() {
        let invocation = parse_args(&args(&["--db", "/tmp/c.db", "inc", "7"])).unwrap();
        assert_eq!(invocation.db_path, Some(PathBuf::from("/tmp/c.db")));
        assert!(invocation.config_path.is_none());
        assert!(matches!(invocation.command, Command::Increment(id) if id == "7"));
    }

    #[test]
    fn test_flag_without_value_is_error() {
        let err = parse_args(&args(&["list", "--config"])).err().unwrap();
        assert_eq!(err, "--config requires a value");

        let err = parse_args(&args(&["--db", "--config", "c.toml", "list"])).err().unwrap();
        assert_eq!(err, "--db requires a value");
    }

    #[test]
    fn test_add_parses_price() {
        let invocation =
            parse_args(&args(&["add", "7", "Linen Shirt", "https://img/7.png", "39.9"])).unwrap();
        match invocation.command {
            Command::Add(product) => assert_eq!(product.price, 39.9),
            _ => panic!("expected add"),
        }

        assert!(parse_args(&args(&["add", "7", "t", "u", "cheap"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }
}
