//! Minimum interval between settled calls.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::RequestKey;
use crate::telemetry;
use crate::{MimirError, Result};

/// Rejects an operation on a key that settled less than `min_interval` ago.
///
/// Rejected calls are refused outright, not queued.
pub struct Throttle {
    min_interval: Duration,
    settled: Mutex<HashMap<RequestKey, Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            settled: Mutex::new(HashMap::new()),
        }
    }

    /// `Err(Throttled)` if `key` settled too recently.
    pub fn check(&self, key: &RequestKey) -> Result<()> {
        let settled = self.lock();
        match settled.get(key) {
            Some(at) if at.elapsed() < self.min_interval => {
                debug!(%key, "request throttled");
                metrics::counter!(telemetry::THROTTLED_TOTAL, "operation" => key.endpoint())
                    .increment(1);
                Err(MimirError::Throttled)
            }
            _ => Ok(()),
        }
    }

    /// Mark `key` as settled now (success or failure).
    pub fn record(&self, key: &RequestKey) {
        self.lock().insert(key.clone(), Instant::now());
    }

    /// Forget when `key` last settled.
    pub fn reset(&self, key: &RequestKey) {
        self.lock().remove(key);
    }

    /// Forget every key.
    pub fn reset_all(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestKey, Instant>> {
        self.settled.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rejects_within_interval_only() {
        let throttle = Throttle::new(Duration::from_secs(2));
        let key = RequestKey::new("documents").param("document_type", "all");

        assert!(throttle.check(&key).is_ok());
        throttle.record(&key);
        assert!(matches!(throttle.check(&key), Err(MimirError::Throttled)));

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(throttle.check(&key).is_err());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(throttle.check(&key).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let throttle = Throttle::new(Duration::from_secs(2));
        let all = RequestKey::new("documents").param("document_type", "all");
        let notes = RequestKey::new("documents").param("document_type", 2);
        throttle.record(&all);
        assert!(throttle.check(&notes).is_ok());
        throttle.reset(&all);
        assert!(throttle.check(&all).is_ok());
    }
}
