//! Request coalescing
//!
//! A process-wide registry mapping an in-flight operation's key to its
//! pending result. The first caller for a key starts the operation; callers
//! arriving while it is pending attach to the same shared future and observe
//! the identical outcome, including identical errors. The entry is removed
//! as soon as the operation settles, so a later call with the same key
//! starts fresh.
//!
//! Registries are owned by the engine instance rather than being true
//! globals, so tests isolate themselves with fresh instances. Once started,
//! an operation runs to completion; waiters cannot cancel it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use orderbridge_domain::Result;
use parking_lot::Mutex;
use tracing::debug;

struct Entry<T> {
    /// Distinguishes this execution from a later one under the same key, so
    /// a slow waiter never evicts a fresh entry.
    generation: u64,
    shared: Shared<BoxFuture<'static, Result<T>>>,
}

/// Registry guaranteeing at most one concurrent execution per key.
pub struct RequestCoalescer<T> {
    generations: AtomicU64,
    in_flight: Mutex<HashMap<String, Entry<T>>>,
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { generations: AtomicU64::new(0), in_flight: Mutex::new(HashMap::new()) }
    }

    /// Run `make_operation`'s future under `key`, or attach to the one
    /// already pending for it.
    ///
    /// The operation is passed as a closure so a joining caller never
    /// constructs it. Every waiter receives a clone of the single result.
    pub async fn run<F, Fut>(&self, key: &str, make_operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (generation, shared) = {
            let mut in_flight = self.in_flight.lock();
            if let Some(entry) = in_flight.get(key) {
                debug!(key, "joining in-flight operation");
                (entry.generation, entry.shared.clone())
            } else {
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                let shared = make_operation().boxed().shared();
                in_flight
                    .insert(key.to_owned(), Entry { generation, shared: shared.clone() });
                (generation, shared)
            }
        };

        let result = shared.await;

        // Deregister on settle, success or failure. Generation-checked so a
        // waiter that observed an old execution cannot remove its successor.
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|entry| entry.generation == generation) {
            in_flight.remove(key);
        }

        result
    }

    /// Number of operations currently pending.
    pub fn pending(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl<T> Default for RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
