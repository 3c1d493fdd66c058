//! Single-flight deduplication of concurrent requests.
//!
//! At most one request per [`RequestKey`] is in flight. The first caller
//! becomes the leader and performs the call; later callers for the same key
//! wait for the leader's result instead of issuing their own.
//!
//! A leader that is dropped without settling (its view session was
//! cancelled, or its task was aborted) settles every waiter with
//! [`MimirError::Cancelled`] and frees the key, so a new caller can start a
//! fresh request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

use crate::cache::RequestKey;
use crate::telemetry;
use crate::{MimirError, Result};

type Settled<V> = Option<Result<V>>;

/// Registry of in-flight requests producing values of type `V`.
pub struct InFlight<V> {
    operation: &'static str,
    calls: Mutex<HashMap<RequestKey, watch::Receiver<Settled<V>>>>,
}

/// Result of [`InFlight::acquire`].
pub enum Acquired<'a, V> {
    /// No request was in flight: the caller must perform it and settle.
    Leader(Flight<'a, V>),
    /// A request is already in flight: wait for its result.
    Follower(Waiter<V>),
}

impl<V> Acquired<'_, V> {
    pub fn is_new(&self) -> bool {
        matches!(self, Acquired::Leader(_))
    }
}

impl<V: Clone> InFlight<V> {
    /// Create a registry. `operation` labels metrics.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Register interest in `key`.
    pub fn acquire(&self, key: RequestKey) -> Acquired<'_, V> {
        let mut calls = self.lock();
        if let Some(rx) = calls.get(&key) {
            debug!(operation = self.operation, %key, "joining in-flight request");
            metrics::counter!(telemetry::DEDUP_JOINS_TOTAL, "operation" => self.operation)
                .increment(1);
            return Acquired::Follower(Waiter { rx: rx.clone() });
        }

        let (tx, rx) = watch::channel(None);
        calls.insert(key.clone(), rx);
        Acquired::Leader(Flight {
            owner: self,
            key,
            tx,
            settled: false,
        })
    }

    /// Run `call` as leader, or wait for the existing leader's result.
    pub async fn run<F, Fut>(&self, key: RequestKey, call: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        match self.acquire(key) {
            Acquired::Leader(flight) => {
                let result = call().await;
                flight.settle(result.clone());
                result
            }
            Acquired::Follower(waiter) => waiter.wait().await,
        }
    }

    /// Whether a request for `key` is currently in flight.
    pub fn is_in_flight(&self, key: &RequestKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> InFlight<V> {
    fn remove(&self, key: &RequestKey) {
        self.lock().remove(key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestKey, watch::Receiver<Settled<V>>>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Leader handle for one in-flight request.
pub struct Flight<'a, V> {
    owner: &'a InFlight<V>,
    key: RequestKey,
    tx: watch::Sender<Settled<V>>,
    settled: bool,
}

impl<V> Flight<'_, V> {
    /// Publish the result to every waiter and free the key.
    pub fn settle(mut self, result: Result<V>) {
        self.finish(result);
    }

    fn finish(&mut self, result: Result<V>) {
        self.settled = true;
        // Free the key first so a woken waiter can immediately start a new call.
        self.owner.remove(&self.key);
        self.tx.send_replace(Some(result));
    }
}

impl<V> Drop for Flight<'_, V> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(operation = self.owner.operation, key = %self.key, "in-flight request abandoned");
            self.finish(Err(MimirError::Cancelled));
        }
    }
}

/// Follower handle: resolves to the leader's result.
pub struct Waiter<V> {
    rx: watch::Receiver<Settled<V>>,
}

impl<V: Clone> Waiter<V> {
    pub async fn wait(mut self) -> Result<V> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(settled) => settled.clone().unwrap_or(Err(MimirError::Cancelled)),
            Err(_) => Err(MimirError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn key() -> RequestKey {
        RequestKey::new("summary").param("doc", 1)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_call() {
        let inflight = InFlight::<String>::new("summary");
        let calls = AtomicU32::new(0);
        let call = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok("done".to_string())
        };

        let (a, b) = tokio::join!(inflight.run(key(), call), inflight.run(key(), call));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "done");
        assert_eq!(b.unwrap(), "done");
        assert!(inflight.is_empty());
    }

    #[tokio::test]
    async fn failures_fan_out_too() {
        let inflight = InFlight::<u32>::new("quiz");
        let Acquired::Leader(flight) = inflight.acquire(key()) else {
            panic!("first acquire must lead");
        };
        let follower = inflight.acquire(key());
        assert!(!follower.is_new());
        let Acquired::Follower(waiter) = follower else {
            unreachable!()
        };
        flight.settle(Err(MimirError::NotFound));
        assert!(matches!(waiter.wait().await, Err(MimirError::NotFound)));
    }

    #[tokio::test]
    async fn dropped_leader_cancels_waiters_and_frees_key() {
        let inflight = Arc::new(InFlight::<u32>::new("quiz"));
        let flight = inflight.acquire(key());
        let Acquired::Follower(waiter) = inflight.acquire(key()) else {
            panic!("second acquire must follow");
        };

        drop(flight);

        assert!(matches!(waiter.wait().await, Err(MimirError::Cancelled)));
        assert!(!inflight.is_in_flight(&key()));
        assert!(inflight.acquire(key()).is_new());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share() {
        let inflight = InFlight::<u32>::new("summary");
        let a = inflight.acquire(RequestKey::new("summary").param("doc", 1));
        let b = inflight.acquire(RequestKey::new("summary").param("doc", 2));
        assert!(a.is_new());
        assert!(b.is_new());
        assert_eq!(inflight.len(), 2);
    }
}
