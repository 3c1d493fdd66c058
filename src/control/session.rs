//! View-scoped cancellation.
//!
//! A [`ViewSession`] represents one live screen. Requests started through it
//! are abandoned when the session is cancelled or dropped, and a request in
//! a named slot is abandoned when a newer request takes the same slot.
//! Abandoned requests resolve to [`MimirError::Cancelled`] and never touch
//! caches or stored state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::DebounceGate;
use crate::{MimirError, Result};

pub struct ViewSession {
    token: CancellationToken,
    slots: Mutex<HashMap<&'static str, CancellationToken>>,
    debounce: DebounceGate,
}

impl ViewSession {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            slots: Mutex::new(HashMap::new()),
            debounce: DebounceGate::new(),
        }
    }

    /// Debounce triggers local to this view.
    pub fn debounce(&self) -> &DebounceGate {
        &self.debounce
    }

    /// Cancel every request started through this session.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("view session cancelled");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token cancelled together with the session.
    pub fn child(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Token for a new request in `slot`; cancels the previous one.
    pub fn scope(&self, slot: &'static str) -> CancellationToken {
        let token = self.token.child_token();
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slots.insert(slot, token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Run `work` until it completes or the session is cancelled.
    pub async fn run<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        guarded(&self.child(), work).await
    }
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Run `work` until it completes or `token` is cancelled.
///
/// A result that arrives after cancellation is discarded.
pub async fn guarded<T>(
    token: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(MimirError::Cancelled),
        result = work => {
            if token.is_cancelled() {
                Err(MimirError::Cancelled)
            } else {
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn slow(value: u32) -> Result<u32> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_pending_work() {
        let session = ViewSession::new();
        let work = session.run(slow(1));
        tokio::pin!(work);

        tokio::select! {
            _ = &mut work => panic!("work should still be pending"),
            _ = tokio::time::sleep(Duration::from_secs(1)) => session.cancel(),
        }
        assert!(matches!(work.await, Err(MimirError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_slot() {
        let session = ViewSession::new();
        let first = session.scope("documents");
        let second = session.scope("documents");
        let other = session.scope("types");

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!other.is_cancelled());
        assert!(matches!(guarded(&first, slow(1)).await, Err(MimirError::Cancelled)));
        assert_eq!(guarded(&second, slow(2)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn drop_cancels_outstanding_tokens() {
        let session = ViewSession::new();
        let token = session.scope("summary");
        let child = session.child();
        drop(session);
        assert!(token.is_cancelled());
        assert!(child.is_cancelled());
    }
}
