//! Trailing-edge debounce.
//!
//! Every call to [`DebounceGate::schedule`] for a trigger supersedes the
//! calls made before it. A call only runs its action once its quiet period
//! elapses with no newer call for the same trigger; superseded calls return
//! `None` without running anything.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tracing::trace;

/// Debounce state for any number of named triggers.
#[derive(Default)]
pub struct DebounceGate {
    generations: Mutex<HashMap<String, u64>>,
}

impl DebounceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `quiet`, then run `action` unless a newer call for `trigger`
    /// arrived in the meantime.
    pub async fn schedule<F, Fut, T>(&self, trigger: &str, quiet: Duration, action: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.quiet_period(trigger, quiet).await {
            Some(action().await)
        } else {
            None
        }
    }

    /// Wait `quiet` and report whether this call is still the latest for
    /// `trigger`.
    pub async fn quiet_period(&self, trigger: &str, quiet: Duration) -> bool {
        let ticket = self.bump(trigger);
        tokio::time::sleep(quiet).await;
        let latest = self.current(trigger) == ticket;
        if !latest {
            trace!(trigger, "debounced call superseded");
        }
        latest
    }

    /// Supersede every pending call for `trigger`.
    pub fn cancel(&self, trigger: &str) {
        self.bump(trigger);
    }

    fn bump(&self, trigger: &str) -> u64 {
        let mut generations = self.lock();
        let generation = generations.entry(trigger.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn current(&self, trigger: &str) -> u64 {
        self.lock().get(trigger).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        self.generations.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn rapid_calls_collapse_to_last() {
        let gate = Arc::new(DebounceGate::new());
        let fired = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();

        for i in 0..5u32 {
            let gate = gate.clone();
            let fired = fired.clone();
            handles.push(tokio::spawn(async move {
                gate.schedule("suggest", Duration::from_millis(500), || async move {
                    fired.fetch_add(1, Ordering::SeqCst);
                    i
                })
                .await
            }));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(results, vec![None, None, None, None, Some(4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_calls_both_fire() {
        let gate = DebounceGate::new();
        let quiet = Duration::from_millis(500);
        assert_eq!(gate.schedule("t", quiet, || async { 1 }).await, Some(1));
        assert_eq!(gate.schedule("t", quiet, || async { 2 }).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn triggers_are_independent() {
        let gate = DebounceGate::new();
        let quiet = Duration::from_millis(500);
        let (a, b) = tokio::join!(
            gate.schedule("a", quiet, || async { "a" }),
            gate.schedule("b", quiet, || async { "b" }),
        );
        assert_eq!((a, b), (Some("a"), Some("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_supersedes_pending_call() {
        let gate = Arc::new(DebounceGate::new());
        let pending = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.schedule("docs", Duration::from_secs(1), || async {})
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.cancel("docs");
        assert_eq!(pending.await.unwrap(), None);
    }
}
