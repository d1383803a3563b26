//! # Cart Store
//!
//! The persisted cart state container handed to the storefront UI.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CartStore Operations                                 │
//! │                                                                         │
//! │  UI call                 synchronous part            trailing part      │
//! │  ───────                 ────────────────            ─────────────      │
//! │                                                                         │
//! │  add_to_cart(product) ─► lock, cart.add, publish ──► Job::Persist      │
//! │  increment(id) ────────► lock, cart.increment, .. ─► Job::Persist      │
//! │  decrement(id) ────────► lock, cart.decrement, .. ─► Job::Persist      │
//! │                                  │                        │             │
//! │                                  ▼                        ▼             │
//! │                          watch subscribers        PendingWrite resolves │
//! │                          see the new cart         when the write lands  │
//! │                                                                         │
//! │  products() / totals() / subscribe() are read-only views.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! Cart state sits behind a `std::sync::Mutex` held only for the
//! synchronous part of an operation, never across an `.await`. Every
//! storage call goes through the store's single [`PersistenceWriter`].
//!
//! [`PersistenceWriter`]: crate::writer

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::{broadcast, oneshot, watch};
use tracing::{debug, warn};

use marketplace_core::validation::validate_product;
use marketplace_core::{Cart, CartOp, CartTotals, CoreError, LineItem, Product, STORAGE_KEY};
use marketplace_store::KeyValueStore;

use crate::error::{CartError, CartResult, PersistenceFailure};
use crate::writer::{Hydration, PersistenceWriter, WriteAck, WriterHandle};

/// Buffered persistence failure events per subscriber.
const FAILURE_CHANNEL_CAPACITY: usize = 16;

// =============================================================================
// Shared State
// =============================================================================

pub(crate) struct CartState {
    pub(crate) cart: Cart,

    /// Number of operations that actually changed the cart.
    pub(crate) revision: u64,

    /// Set once the persisted snapshot has been read (or failed to be).
    pub(crate) hydrated: bool,

    /// Operations applied before hydration, replayed onto the loaded cart.
    pub(crate) backlog: Vec<CartOp>,
}

/// State shared between the store and its writer task.
pub(crate) struct Shared {
    pub(crate) key: String,
    state: Mutex<CartState>,
    snapshots: watch::Sender<Vec<LineItem>>,
    pub(crate) failures: broadcast::Sender<PersistenceFailure>,
}

impl Shared {
    pub(crate) fn new(key: String) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Shared {
            key,
            state: Mutex::new(CartState {
                cart: Cart::new(),
                revision: 0,
                hydrated: false,
                backlog: Vec::new(),
            }),
            snapshots,
            failures,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CartState> {
        // A panic mid-mutation cannot leave the Vec half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, cart: &Cart) {
        self.snapshots.send_replace(cart.items().to_vec());
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// Persisted shopping cart.
///
/// Construct once at application start and hand an `Arc<CartStore>` to
/// every consumer.
///
/// ## Usage
/// ```rust,ignore
/// let kv: Arc<dyn KeyValueStore> = Arc::new(db.kv());
/// let cart = CartStore::open(kv, STORAGE_KEY).await;
///
/// cart.add_to_cart(product).await?;
/// cart.increment("p1").await?;
/// ```
pub struct CartStore {
    shared: Arc<Shared>,
    writer: WriterHandle,
}

impl CartStore {
    /// Creates an empty store and queues hydration from `key` in the
    /// background. Must be called from within a tokio runtime.
    ///
    /// The store is usable immediately. Once the read resolves the cart
    /// becomes the persisted contents with any operations made in the
    /// meantime applied on top.
    pub fn spawn(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Arc<Self> {
        let (store, hydration) = Self::start(kv, key.into());
        if let Err(e) = hydration {
            warn!(error = %e, "Could not queue cart hydration");
        }
        store
    }

    /// Like [`spawn`](Self::spawn) but waits for hydration to settle.
    /// Load failures are logged and leave the cart empty.
    pub async fn open(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Arc<Self> {
        let (store, hydration) = Self::start(kv, key.into());
        match Self::await_hydration(hydration).await {
            Ok(outcome) => debug!(?outcome, "Cart ready"),
            Err(e) => warn!(error = %e, "Cart opened without persisted contents"),
        }
        store
    }

    /// Like [`open`](Self::open) but returns load failures.
    pub async fn try_open(
        kv: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
    ) -> CartResult<(Arc<Self>, Hydration)> {
        let (store, hydration) = Self::start(kv, key.into());
        let outcome = Self::await_hydration(hydration).await?;
        Ok((store, outcome))
    }

    /// Opens a store under the default key.
    pub async fn open_default(kv: Arc<dyn KeyValueStore>) -> Arc<Self> {
        Self::open(kv, STORAGE_KEY).await
    }

    fn start(
        kv: Arc<dyn KeyValueStore>,
        key: String,
    ) -> (Arc<Self>, CartResult<oneshot::Receiver<CartResult<Hydration>>>) {
        let shared = Arc::new(Shared::new(key));
        let (writer, handle) = PersistenceWriter::new(Arc::clone(&shared), kv);
        tokio::spawn(writer.run());

        // Queued before any mutation can be, so it is always the first job.
        let hydration = handle.hydrate();
        let store = Arc::new(CartStore {
            shared,
            writer: handle,
        });
        (store, hydration)
    }

    async fn await_hydration(
        hydration: CartResult<oneshot::Receiver<CartResult<Hydration>>>,
    ) -> CartResult<Hydration> {
        hydration?.await.map_err(|_| CartError::WriterClosed)?
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Storage key this cart persists under.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Current items, in order.
    pub fn products(&self) -> Vec<LineItem> {
        self.shared.lock().cart.items().to_vec()
    }

    /// Item count, unit count and subtotal of the current cart.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from(&self.shared.lock().cart)
    }

    /// Receives the item list after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineItem>> {
        self.shared.snapshots.subscribe()
    }

    /// Receives every failed snapshot write from now on.
    pub fn failures(&self) -> broadcast::Receiver<PersistenceFailure> {
        self.shared.failures.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Appends `product` with quantity 1. Adding an id that is already in
    /// the cart creates a second entry.
    ///
    /// The cart is updated before this returns; await the result to learn
    /// whether the write reached storage. A product with a non-finite price
    /// is rejected without touching the cart.
    pub fn add_to_cart(&self, product: Product) -> PendingWrite {
        if let Err(e) = validate_product(&product) {
            warn!(id = %product.id, error = %e, "Rejected product");
            return PendingWrite::failed(CartError::Core(CoreError::Validation(e)));
        }
        let id = product.id.clone();
        self.apply("add_to_cart", &id, CartOp::Add(product))
    }

    /// Adds one unit to the first entry with this id. An unknown id leaves
    /// the cart as it is; the snapshot is written either way.
    pub fn increment(&self, id: &str) -> PendingWrite {
        self.apply("increment", id, CartOp::Increment(id.to_string()))
    }

    /// Removes one unit from the first entry with this id, removing the
    /// entry at its last unit. An unknown id leaves the cart as it is; the
    /// snapshot is written either way.
    pub fn decrement(&self, id: &str) -> PendingWrite {
        self.apply("decrement", id, CartOp::Decrement(id.to_string()))
    }

    /// Waits until every write queued before this call has settled.
    pub async fn flush(&self) -> CartResult<()> {
        self.writer
            .flush()?
            .await
            .map_err(|_| CartError::WriterClosed)
    }

    fn apply(&self, op_name: &'static str, id: &str, op: CartOp) -> PendingWrite {
        {
            let mut state = self.shared.lock();
            let outcome = state.cart.apply(&op);
            if !state.hydrated {
                state.backlog.push(op);
            }
            if outcome.is_changed() {
                state.revision += 1;
                self.shared.publish(&state.cart);
            }
            debug!(
                op = op_name,
                id = %id,
                changed = outcome.is_changed(),
                items = state.cart.item_count(),
                "Cart operation"
            );
        }

        match self.writer.persist() {
            Ok(rx) => PendingWrite::queued(rx),
            Err(e) => PendingWrite::failed(e),
        }
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("CartStore")
            .field("key", &self.shared.key)
            .field("items", &state.cart.item_count())
            .field("revision", &state.revision)
            .finish()
    }
}

// =============================================================================
// Pending Write
// =============================================================================

/// The trailing snapshot write of a cart operation.
///
/// Dropping it does not cancel the write. Awaiting it yields
/// [`CartError::Persistence`] if the write failed.
#[derive(Debug)]
pub struct PendingWrite {
    state: PendingState,
}

#[derive(Debug)]
enum PendingState {
    Queued(oneshot::Receiver<WriteAck>),
    Failed(Option<CartError>),
}

impl PendingWrite {
    fn queued(rx: oneshot::Receiver<WriteAck>) -> Self {
        PendingWrite {
            state: PendingState::Queued(rx),
        }
    }

    fn failed(err: CartError) -> Self {
        PendingWrite {
            state: PendingState::Failed(Some(err)),
        }
    }
}

impl Future for PendingWrite {
    type Output = CartResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            PendingState::Queued(rx) => Pin::new(rx).poll(cx).map(|ack| match ack {
                Ok(Ok(())) => Ok(()),
                Ok(Err(failure)) => Err(CartError::Persistence(failure)),
                Err(_) => Err(CartError::WriterClosed),
            }),
            PendingState::Failed(err) => {
                Poll::Ready(Err(err.take().unwrap_or(CartError::WriterClosed)))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
