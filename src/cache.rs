//! Cache storage module
//!
//! This module provides in-memory memoization of fallible async fetches,
//! keyed per resource. Concurrent requests for the same key share a single
//! in-flight fetch. Successful results are kept for the lifetime of the
//! storage; failed fetches are forgotten so the next request retries.

use crate::catalog::CatalogError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, CatalogError>>>;

/// State of a single cache key
enum Slot<V> {
    /// Fetched successfully, never refetched
    Ready(V),
    /// A fetch is running; every caller awaits this same future
    InFlight {
        generation: u64,
        fetch: SharedFetch<V>,
    },
}

/// A single-flight memoizer for fallible async fetches
///
/// `V` is handed out by clone, so it should be cheap to clone (an `Arc`).
pub(crate) struct SingleFlight<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    /// Tags each fetch so a completion only settles the slot it started
    next_generation: AtomicU64,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Returns the stored value for `key`, fetching it if necessary
    ///
    /// # Arguments
    ///
    /// * `key` - The resource to look up
    /// * `fetch` - Produces the fetch future; only called when no value is
    ///   stored and no fetch for `key` is running
    ///
    /// # Errors
    ///
    /// Returns the fetch error. The error is not stored: a later call
    /// starts a new fetch.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, CatalogError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        let (generation, shared) = {
            let mut slots = self.lock();
            match slots.get(&key) {
                Some(Slot::Ready(value)) => {
                    trace!(?key, "cache hit");
                    return Ok(value.clone());
                }
                Some(Slot::InFlight { generation, fetch }) => {
                    trace!(?key, "joining in-flight fetch");
                    (*generation, fetch.clone())
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let shared = fetch().boxed().shared();
                    slots.insert(
                        key.clone(),
                        Slot::InFlight {
                            generation,
                            fetch: shared.clone(),
                        },
                    );
                    (generation, shared)
                }
            }
        };

        let result = shared.await;

        // Whichever waiter finishes first settles the slot; the rest find it
        // already settled (or replaced by a newer fetch) and leave it alone.
        let mut slots = self.lock();
        let settles = matches!(
            slots.get(&key),
            Some(Slot::InFlight { generation: current, .. }) if *current == generation
        );
        if settles {
            match &result {
                Ok(value) => {
                    slots.insert(key, Slot::Ready(value.clone()));
                }
                Err(_) => {
                    slots.remove(&key);
                }
            }
        }

        result
    }

    /// Returns the stored value for `key` without fetching
    pub fn cached(&self, key: &K) -> Option<V> {
        match self.lock().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns whether a fetch for `key` is currently running
    pub fn is_in_flight(&self, key: &K) -> bool {
        matches!(self.lock().get(key), Some(Slot::InFlight { .. }))
    }

    /// Number of keys holding a fetched value
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        // The map is consistent after every statement, so a poisoned lock
        // still guards valid data.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
