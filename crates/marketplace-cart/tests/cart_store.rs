//! End-to-end behavior of `CartStore` against real and misbehaving stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use marketplace_cart::{CartError, CartProvider, CartStore, Hydration, LineItem, Product, STORAGE_KEY};
use marketplace_core::{Cart, CoreError};
use marketplace_store::{Database, DbConfig, KeyValueStore, MemoryStore, StoreError, StoreResult};

// =============================================================================
// Helpers
// =============================================================================

fn shirt() -> Product {
    Product::new("p1", "Shirt", "u", 10.0)
}

fn mug() -> Product {
    Product::new("p2", "Mug", "https://img/p2.png", 7.5)
}

async fn stored_items(kv: &dyn KeyValueStore) -> Vec<LineItem> {
    let raw = kv.get(STORAGE_KEY).await.unwrap().unwrap_or_default();
    Cart::from_snapshot(&raw).unwrap().into_items()
}

/// Store whose writes fail while `failing` is set.
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
    fail_reads: bool,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("storage offline".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::QueryFailed("disk full".into()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key).await
    }
}

/// Store whose reads wait for `release` and whose writes are slow.
#[derive(Debug)]
struct SlowStore {
    inner: MemoryStore,
    release: Notify,
    write_delay: Duration,
}

impl SlowStore {
    fn new(inner: MemoryStore, write_delay: Duration) -> Self {
        SlowStore {
            inner,
            release: Notify::new(),
            write_delay,
        }
    }
}

#[async_trait]
impl KeyValueStore for SlowStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.release.notified().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        tokio::time::sleep(self.write_delay).await;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key).await
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_walkthrough() {
    let kv = Arc::new(MemoryStore::new());
    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;
    assert!(cart.products().is_empty());

    // A: add to an empty cart
    cart.add_to_cart(shirt()).await.unwrap();
    assert_eq!(
        cart.products(),
        vec![LineItem {
            id: "p1".into(),
            title: "Shirt".into(),
            image_url: "u".into(),
            price: 10.0,
            quantity: 1,
        }]
    );

    // B: increment
    cart.increment("p1").await.unwrap();
    assert_eq!(cart.products()[0].quantity, 2);

    // C: decrement from 2
    cart.decrement("p1").await.unwrap();
    assert_eq!(cart.products()[0].quantity, 1);

    // D: decrement from 1 removes
    cart.decrement("p1").await.unwrap();
    assert!(cart.products().is_empty());
    assert!(stored_items(kv.as_ref()).await.is_empty());
}

#[tokio::test]
async fn adding_same_product_twice_keeps_two_entries() {
    let kv = Arc::new(MemoryStore::new());
    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;

    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(shirt()).await.unwrap();

    let items = cart.products();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.id == "p1" && item.quantity == 1));

    // Only the first entry is touched
    cart.increment("p1").await.unwrap();
    let items = cart.products();
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].quantity, 1);

    assert_eq!(stored_items(kv.as_ref()).await, items);
}

#[tokio::test]
async fn missing_id_leaves_cart_unchanged_but_still_writes() {
    let kv = Arc::new(MemoryStore::new());
    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;
    cart.add_to_cart(shirt()).await.unwrap();
    let before = cart.products();

    kv.remove(STORAGE_KEY).await.unwrap();
    cart.increment("missing").await.unwrap();
    assert_eq!(cart.products(), before);
    assert_eq!(stored_items(kv.as_ref()).await, before);

    cart.decrement("missing").await.unwrap();
    assert_eq!(cart.products(), before);
}

#[tokio::test]
async fn quantities_stay_positive_over_operation_sequences() {
    let cart = CartStore::open(Arc::new(MemoryStore::new()), STORAGE_KEY).await;
    let ids = ["p1", "p2", "p3", "missing"];

    // Deterministic LCG so failures reproduce
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..300 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let id = ids[(seed >> 33) as usize % ids.len()];
        let pending = match (seed >> 20) % 3 {
            0 => cart.add_to_cart(Product::new(id, "Item", "u", 1.0)),
            1 => cart.increment(id),
            _ => cart.decrement(id),
        };
        drop(pending);

        assert!(cart.products().iter().all(|item| item.quantity >= 1));
    }

    cart.flush().await.unwrap();
}

// =============================================================================
// Hydration
// =============================================================================

#[tokio::test]
async fn restart_restores_same_items_in_order() {
    let kv = Arc::new(MemoryStore::new());
    {
        let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;
        cart.add_to_cart(mug()).await.unwrap();
        cart.add_to_cart(shirt()).await.unwrap();
        cart.increment("p1").await.unwrap();
    }

    let (reopened, outcome) = CartStore::try_open(kv.clone(), STORAGE_KEY).await.unwrap();
    assert_eq!(outcome, Hydration::Loaded(2));

    let items = reopened.products();
    assert_eq!(items[0].id, "p2");
    assert_eq!(items[1].id, "p1");
    assert_eq!(items[1].quantity, 2);
}

#[tokio::test]
async fn restart_over_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marketplace.db");

    let expected = {
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let cart = CartStore::open(Arc::new(db.kv()), STORAGE_KEY).await;
        cart.add_to_cart(shirt()).await.unwrap();
        cart.add_to_cart(mug()).await.unwrap();
        cart.increment("p2").await.unwrap();
        cart.decrement("p1").await.unwrap();
        let items = cart.products();
        db.close().await;
        items
    };

    let db = Database::new(DbConfig::new(&path)).await.unwrap();
    let cart = CartStore::open(Arc::new(db.kv()), STORAGE_KEY).await;
    assert_eq!(cart.products(), expected);
    assert_eq!(cart.products()[0].quantity, 2);
    db.close().await;
}

#[tokio::test]
async fn restart_keeps_blank_ids_and_exact_prices() {
    let kv = Arc::new(MemoryStore::new());
    let before = {
        let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;
        cart.add_to_cart(Product::new("", "Gift card", "u", 5.0)).await.unwrap();
        cart.add_to_cart(Product::new("p1", "Shirt", "u", 2.2112647588890446e-23))
            .await
            .unwrap();
        cart.add_to_cart(Product::new("p3", "Lamp", "u", 0.1 + 0.2)).await.unwrap();
        cart.products()
    };

    let (reopened, outcome) = CartStore::try_open(kv, STORAGE_KEY).await.unwrap();
    assert_eq!(outcome, Hydration::Loaded(3));
    assert_eq!(reopened.products(), before);
}

#[tokio::test]
async fn hydrates_from_existing_snapshot() {
    let snapshot = serde_json::json!([
        {"id": "p1", "title": "Shirt", "image_url": "u", "price": 10.0, "quantity": 3}
    ])
    .to_string();
    let kv = Arc::new(MemoryStore::with_entry(STORAGE_KEY, snapshot));

    let cart = CartStore::open_default(kv).await;
    assert_eq!(cart.products().len(), 1);
    assert_eq!(cart.totals().total_quantity, 3);
    assert_eq!(cart.totals().subtotal, 30.0);
}

#[tokio::test]
async fn blank_or_empty_snapshot_is_an_empty_cart() {
    for raw in ["", "[]"] {
        let kv = Arc::new(MemoryStore::with_entry(STORAGE_KEY, raw));
        let (cart, outcome) = CartStore::try_open(kv, STORAGE_KEY).await.unwrap();
        assert_eq!(outcome, Hydration::Empty);
        assert!(cart.products().is_empty());
    }
}

#[tokio::test]
async fn corrupt_snapshot_starts_empty() {
    let kv = Arc::new(MemoryStore::with_entry(STORAGE_KEY, "{not json"));

    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;
    assert!(cart.products().is_empty());

    let err = CartStore::try_open(kv, STORAGE_KEY).await.unwrap_err();
    assert!(matches!(err, CartError::Core(CoreError::CorruptSnapshot(_))));
}

#[tokio::test]
async fn failed_load_is_reported_by_try_open() {
    let kv = Arc::new(FlakyStore {
        fail_reads: true,
        ..FlakyStore::default()
    });

    let err = CartStore::try_open(kv.clone(), STORAGE_KEY).await.unwrap_err();
    assert!(matches!(err, CartError::Load(StoreError::Unavailable(_))));
    assert!(err.is_persistence_error());

    // The store is still usable
    let cart = CartStore::open(kv, STORAGE_KEY).await;
    cart.add_to_cart(shirt()).await.unwrap();
    assert_eq!(cart.products().len(), 1);
}

#[tokio::test]
async fn operations_before_hydration_replay_onto_persisted_cart() {
    let mut persisted = Cart::new();
    persisted.add(mug());
    let seeded = MemoryStore::with_entry(STORAGE_KEY, persisted.to_snapshot().unwrap());
    let kv = Arc::new(SlowStore::new(seeded, Duration::ZERO));

    let cart = CartStore::spawn(kv.clone(), STORAGE_KEY);
    drop(cart.add_to_cart(shirt()));
    // p2 is not in memory yet; applied once the stored cart is in
    let pending = cart.increment("p2");
    assert_eq!(cart.products().len(), 1);

    kv.release.notify_one();
    pending.await.unwrap();

    let items = cart.products();
    assert_eq!(items.len(), 2);
    assert_eq!((items[0].id.as_str(), items[0].quantity), ("p2", 2));
    assert_eq!((items[1].id.as_str(), items[1].quantity), ("p1", 1));
    assert_eq!(stored_items(&kv.inner).await, items);
}

#[tokio::test]
async fn operations_after_hydration_are_applied_once() {
    let mut persisted = Cart::new();
    persisted.add(mug());
    let kv = Arc::new(MemoryStore::with_entry(
        STORAGE_KEY,
        persisted.to_snapshot().unwrap(),
    ));

    let (cart, outcome) = CartStore::try_open(kv, STORAGE_KEY).await.unwrap();
    assert_eq!(outcome, Hydration::Loaded(1));

    // Operations after hydration are not replayed again
    cart.add_to_cart(shirt()).await.unwrap();
    cart.flush().await.unwrap();
    assert_eq!(cart.products().len(), 2);
}

#[tokio::test]
async fn unchanged_cart_before_hydration_does_not_clobber_storage() {
    let seeded = MemoryStore::with_entry(
        STORAGE_KEY,
        Cart::from_items(vec![LineItem::from_product(mug())])
            .unwrap()
            .to_snapshot()
            .unwrap(),
    );
    let kv = Arc::new(SlowStore::new(seeded, Duration::ZERO));

    let cart = CartStore::spawn(kv.clone(), STORAGE_KEY);
    let pending = cart.increment("missing");

    kv.release.notify_one();
    pending.await.unwrap();

    // Hydration ran first, so the write carried the loaded cart
    assert_eq!(cart.products()[0].id, "p2");
    assert_eq!(stored_items(&kv.inner).await, cart.products());
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn failed_write_keeps_state_and_reports() {
    let kv = Arc::new(FlakyStore::default());
    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;
    let mut failures = cart.failures();

    kv.failing.store(true, Ordering::SeqCst);
    let err = cart.add_to_cart(shirt()).await.unwrap_err();

    match &err {
        CartError::Persistence(failure) => {
            assert_eq!(failure.key, STORAGE_KEY);
            assert!(failure.message.contains("disk full"));
        }
        other => panic!("expected persistence error, got {other:?}"),
    }
    assert!(err.is_persistence_error());
    assert_eq!(cart.products().len(), 1);

    let event = failures.recv().await.unwrap();
    assert_eq!(event.key, STORAGE_KEY);

    // Next successful write catches storage up
    kv.failing.store(false, Ordering::SeqCst);
    cart.increment("p1").await.unwrap();
    let stored = stored_items(&kv.inner).await;
    assert_eq!(stored, cart.products());
    assert_eq!(stored[0].quantity, 2);
}

#[tokio::test]
async fn burst_of_unawaited_mutations_ends_with_latest_state() {
    let kv = Arc::new(SlowStore::new(MemoryStore::new(), Duration::from_millis(5)));
    kv.release.notify_one();
    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;

    for i in 0..20 {
        let id = format!("p{}", i % 4);
        drop(cart.add_to_cart(Product::new(id.as_str(), "Item", "u", 2.0)));
        drop(cart.increment(&id));
        if i % 3 == 0 {
            drop(cart.decrement("p0"));
        }
    }

    cart.flush().await.unwrap();
    assert_eq!(stored_items(&kv.inner).await, cart.products());
}

#[tokio::test]
async fn awaited_writes_all_resolve_when_coalesced() {
    let kv = Arc::new(SlowStore::new(MemoryStore::new(), Duration::from_millis(5)));
    kv.release.notify_one();
    let cart = CartStore::open(kv.clone(), STORAGE_KEY).await;

    let writes: Vec<_> = (0..10)
        .map(|i| cart.add_to_cart(Product::new(format!("p{i}"), "Item", "u", 1.0)))
        .collect();
    for write in writes {
        write.await.unwrap();
    }

    assert_eq!(stored_items(&kv.inner).await.len(), 10);
}

// =============================================================================
// Provider
// =============================================================================

#[tokio::test]
async fn provider_hands_out_the_store() {
    let provider = CartProvider::new();
    assert!(matches!(provider.use_cart(), Err(CartError::NotProvided)));

    provider.provide(CartStore::open(Arc::new(MemoryStore::new()), STORAGE_KEY).await);
    let cart = provider.use_cart().unwrap();
    cart.add_to_cart(shirt()).await.unwrap();

    assert_eq!(provider.use_cart().unwrap().products().len(), 1);
}
