//! # Persistence Writer
//!
//! The single task that reads and writes the cart snapshot for one store.
//!
//! ## Writer Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Persistence Writer Flow                              │
//! │                                                                         │
//! │  CartStore::spawn ──► Job::Hydrate  (always first in the queue)        │
//! │  add/inc/dec ───────► Job::Persist  (one per mutation)                 │
//! │  flush ─────────────► Job::Flush                                       │
//! │                                                                         │
//! │                 mpsc (FIFO)                                             │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    PersistenceWriter::run                       │   │
//! │  │                                                                 │   │
//! │  │  Hydrate: kv.get(key) → decode → replay backlog → install      │   │
//! │  │                                                                 │   │
//! │  │  Persist: drain consecutive Persist jobs                        │   │
//! │  │           serialize CURRENT cart state                          │   │
//! │  │           kv.set(key, snapshot)                                 │   │
//! │  │           ack every drained job with the one result            │   │
//! │  │                                                                 │   │
//! │  │  Flush:   ack (all earlier jobs have settled)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  At most one kv call in flight. The snapshot is taken when the write  │
//! │  starts, so the last write to land always carries the newest cart.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use marketplace_core::Cart;
use marketplace_store::KeyValueStore;

use crate::error::{CartError, CartResult, PersistenceFailure};
use crate::store::Shared;

/// Outcome of a snapshot write, as seen by the mutation that asked for it.
pub(crate) type WriteAck = Result<(), PersistenceFailure>;

/// What hydration did with the persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// This many items were installed as the cart.
    Loaded(usize),
    /// Nothing (or an empty list) was stored.
    Empty,
    /// Operations issued before the read resolved were applied on top of
    /// the `loaded` persisted items.
    Replayed { loaded: usize, replayed: usize },
}

pub(crate) enum Job {
    Hydrate {
        ack: oneshot::Sender<CartResult<Hydration>>,
    },
    Persist {
        ack: oneshot::Sender<WriteAck>,
    },
    Flush {
        ack: oneshot::Sender<()>,
    },
}

/// Sending side of the writer queue.
#[derive(Debug, Clone)]
pub(crate) struct WriterHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WriterHandle {
    pub(crate) fn hydrate(&self) -> CartResult<oneshot::Receiver<CartResult<Hydration>>> {
        let (ack, rx) = oneshot::channel();
        self.send(Job::Hydrate { ack })?;
        Ok(rx)
    }

    pub(crate) fn persist(&self) -> CartResult<oneshot::Receiver<WriteAck>> {
        let (ack, rx) = oneshot::channel();
        self.send(Job::Persist { ack })?;
        Ok(rx)
    }

    pub(crate) fn flush(&self) -> CartResult<oneshot::Receiver<()>> {
        let (ack, rx) = oneshot::channel();
        self.send(Job::Flush { ack })?;
        Ok(rx)
    }

    fn send(&self, job: Job) -> CartResult<()> {
        self.tx.send(job).map_err(|_| CartError::WriterClosed)
    }
}

/// Background task owning all storage access for one cart.
pub(crate) struct PersistenceWriter {
    shared: Arc<Shared>,
    kv: Arc<dyn KeyValueStore>,
    rx: mpsc::UnboundedReceiver<Job>,
}

impl PersistenceWriter {
    /// Creates a writer and the handle that feeds it.
    pub(crate) fn new(shared: Arc<Shared>, kv: Arc<dyn KeyValueStore>) -> (Self, WriterHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PersistenceWriter { shared, kv, rx }, WriterHandle { tx })
    }

    /// Runs until every [`WriterHandle`] is dropped and the queue is drained.
    pub(crate) async fn run(mut self) {
        debug!(key = %self.shared.key, "Persistence writer starting");

        let mut carried: Option<Job> = None;
        loop {
            let job = match carried.take() {
                Some(job) => job,
                None => match self.rx.recv().await {
                    Some(job) => job,
                    None => break,
                },
            };

            match job {
                Job::Hydrate { ack } => {
                    let result = self.hydrate().await;
                    if let Err(e) = &result {
                        warn!(key = %self.shared.key, error = %e, "Cart hydration failed; keeping in-memory cart");
                    }
                    let _ = ack.send(result);
                }
                Job::Persist { ack } => {
                    let mut acks = vec![ack];
                    while let Ok(next) = self.rx.try_recv() {
                        match next {
                            Job::Persist { ack } => acks.push(ack),
                            other => {
                                carried = Some(other);
                                break;
                            }
                        }
                    }

                    let result = self.persist().await;
                    if acks.len() > 1 {
                        debug!(coalesced = acks.len(), "Coalesced cart writes");
                    }
                    for ack in acks {
                        let _ = ack.send(result.clone());
                    }
                }
                Job::Flush { ack } => {
                    let _ = ack.send(());
                }
            }
        }

        debug!(key = %self.shared.key, "Persistence writer stopped");
    }

    /// Reads the snapshot, replays the operations made while the read was
    /// pending, and installs the result.
    ///
    /// On a failed read the in-memory cart (backlog already applied to an
    /// empty cart) stays as it is.
    async fn hydrate(&self) -> CartResult<Hydration> {
        let key = &self.shared.key;
        let loaded = self.load().await;

        let mut state = self.shared.lock();
        state.hydrated = true;
        let backlog = std::mem::take(&mut state.backlog);
        let mut cart = loaded?;

        let persisted = cart.item_count();
        if backlog.is_empty() {
            if cart.is_empty() {
                info!(key = %key, "No persisted cart");
                return Ok(Hydration::Empty);
            }
            state.cart = cart;
            self.shared.publish(&state.cart);
            info!(key = %key, items = persisted, "Cart hydrated");
            return Ok(Hydration::Loaded(persisted));
        }

        for op in &backlog {
            cart.apply(op);
        }
        state.cart = cart;
        self.shared.publish(&state.cart);
        info!(
            key = %key,
            persisted_items = persisted,
            replayed = backlog.len(),
            items = state.cart.item_count(),
            "Cart hydrated; replayed operations made during load"
        );
        Ok(Hydration::Replayed {
            loaded: persisted,
            replayed: backlog.len(),
        })
    }

    async fn load(&self) -> CartResult<Cart> {
        match self.kv.get(&self.shared.key).await? {
            Some(raw) => Ok(Cart::from_snapshot(&raw)?),
            None => Ok(Cart::new()),
        }
    }

    /// Writes the current cart under the key.
    async fn persist(&self) -> WriteAck {
        let key = &self.shared.key;
        let encoded = {
            let state = self.shared.lock();
            state.cart.to_snapshot()
        };

        let result = match encoded {
            Ok(payload) => self
                .kv
                .set(key, &payload)
                .await
                .map_err(|e| PersistenceFailure::new(key.as_str(), e.to_string())),
            Err(e) => Err(PersistenceFailure::new(key.as_str(), e.to_string())),
        };

        match &result {
            Ok(()) => debug!(key = %key, "Cart persisted"),
            Err(failure) => {
                error!(key = %key, error = %failure.message, "Failed to persist cart");
                // No subscribers is fine.
                let _ = self.shared.failures.send(failure.clone());
            }
        }

        result
    }
}
