//! Request id allocation and response matching.

use super::error::TransportError;
use super::framing::RpcError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

type Responder = oneshot::Sender<Result<Value, TransportError>>;

struct PendingRequest {
    method: String,
    responder: Responder,
}

/// Outstanding requests of one connection, keyed by id.
///
/// Whoever removes an entry from the map owns its outcome, so a response,
/// a timeout and a teardown can race without settling a request twice.
/// The map lock is never held across an await.
pub struct Correlator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
}

/// Removes its request from the pending map when dropped, so an abandoned
/// caller does not leave an entry behind.
pub struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.correlator.lock().remove(&self.id).is_some() {
            debug!(id = self.id, "abandoned request removed");
        }
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, PendingRequest>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Allocate the next id and park a receiver for its response.
    pub async fn register(
        &self,
        method: &str,
    ) -> (u64, oneshot::Receiver<Result<Value, TransportError>>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (responder, rx) = oneshot::channel();
        self.lock().insert(
            id,
            PendingRequest {
                method: method.to_string(),
                responder,
            },
        );
        (id, rx)
    }

    /// Tie the lifetime of `id`'s entry to the returned guard.
    pub fn track(&self, id: u64) -> PendingGuard<'_> {
        PendingGuard {
            correlator: self,
            id,
        }
    }

    /// Settle `id` from an inbound response. Returns false for unknown ids.
    pub async fn complete(&self, id: u64, outcome: Result<Value, RpcError>) -> bool {
        let Some(entry) = self.lock().remove(&id) else {
            debug!(id, "dropping response with no pending request");
            return false;
        };
        let result = outcome.map_err(|error| TransportError::ToolProtocol {
            method: entry.method.clone(),
            code: error.code,
            message: error.message,
        });
        let _ = entry.responder.send(result);
        true
    }

    /// Fail every outstanding request with `error`.
    pub async fn fail_all(&self, error: TransportError) {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, entry) in drained {
            let _ = entry.responder.send(Err(error.clone()));
        }
    }

    /// Drop every outstanding request; each waiter observes `Discarded`.
    pub async fn discard_all(&self) -> usize {
        let mut pending = self.lock();
        let count = pending.len();
        pending.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.lock().len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.lock().contains_key(&id)
    }

    /// Wait for the outcome of `id`, bounded by `timeout` when given.
    ///
    /// Dropping the returned future before it settles removes the entry.
    pub async fn await_response(
        &self,
        id: u64,
        method: &str,
        mut rx: oneshot::Receiver<Result<Value, TransportError>>,
        timeout: Option<Duration>,
    ) -> Result<Value, TransportError> {
        let _guard = self.track(id);
        let Some(limit) = timeout else {
            return rx.await.unwrap_or(Err(TransportError::Discarded { id }));
        };

        match tokio::time::timeout(limit, &mut rx).await {
            Ok(received) => received.unwrap_or(Err(TransportError::Discarded { id })),
            Err(_) => {
                let removed = self.lock().remove(&id).is_some();
                if removed {
                    return Err(TransportError::RequestTimeout {
                        method: method.to_string(),
                        id,
                        timeout_ms: limit.as_millis(),
                    });
                }
                // Settled between the timer firing and the removal.
                rx.try_recv()
                    .unwrap_or(Err(TransportError::Discarded { id }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn ids_are_strictly_increasing_from_one() {
        let correlator = Correlator::new();
        let mut previous = 0;
        for _ in 0..5 {
            let (id, _rx) = correlator.register("tools/call").await;
            assert!(id > previous);
            previous = id;
        }
        let (first, _) = Correlator::new().register("initialize").await;
        assert_eq!(first, 1);
        assert_eq!(correlator.len().await, 5);
    }

    #[tokio::test]
    async fn responses_match_by_id_out_of_order() {
        let correlator = Correlator::new();
        let (a, rx_a) = correlator.register("tools/call").await;
        let (b, rx_b) = correlator.register("tools/call").await;

        assert!(correlator.complete(b, Ok(json!("second"))).await);
        assert!(correlator.complete(a, Ok(json!("first"))).await);

        let first = correlator.await_response(a, "tools/call", rx_a, None).await;
        let second = correlator.await_response(b, "tools/call", rx_b, None).await;
        assert_eq!(first.expect("a"), json!("first"));
        assert_eq!(second.expect("b"), json!("second"));
        assert!(correlator.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_and_duplicate_ids_are_ignored() {
        let correlator = Correlator::new();
        assert!(!correlator.complete(42, Ok(Value::Null)).await);

        let (id, rx) = correlator.register("ping").await;
        assert!(correlator.complete(id, Ok(json!(1))).await);
        assert!(!correlator.complete(id, Ok(json!(2))).await);
        let value = correlator.await_response(id, "ping", rx, None).await;
        assert_eq!(value.expect("settled once"), json!(1));
    }

    #[tokio::test]
    async fn error_response_becomes_protocol_error() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.register("tools/call").await;
        correlator
            .complete(
                id,
                Err(RpcError {
                    code: Some(-32000),
                    message: "collection not found".into(),
                }),
            )
            .await;
        let err = correlator
            .await_response(id, "tools/call", rx, None)
            .await
            .expect_err("protocol error");
        assert!(matches!(
            err,
            TransportError::ToolProtocol { code: Some(-32000), .. }
        ));
        assert_eq!(err.to_string(), "tools/call failed: collection not found");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_removes_pending_entry() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.register("tools/call").await;
        let err = correlator
            .await_response(id, "tools/call", rx, Some(Duration::from_secs(30)))
            .await
            .expect_err("timeout");
        assert!(matches!(
            err,
            TransportError::RequestTimeout { id: 1, timeout_ms: 30_000, .. }
        ));
        assert!(!correlator.contains(id).await);
        // A late response is a no-op.
        assert!(!correlator.complete(id, Ok(Value::Null)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn response_before_deadline_wins() {
        let correlator = Arc::new(Correlator::new());
        let (id, rx) = correlator.register("tools/call").await;
        let responder = Arc::clone(&correlator);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            responder.complete(id, Ok(json!({"ok": true}))).await;
        });
        let value = correlator
            .await_response(id, "tools/call", rx, Some(Duration::from_secs(30)))
            .await
            .expect("response");
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn discard_all_releases_waiters() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.register("tools/call").await;
        assert_eq!(correlator.discard_all().await, 1);
        let err = correlator
            .await_response(id, "tools/call", rx, None)
            .await
            .expect_err("discarded");
        assert!(matches!(err, TransportError::Discarded { id: 1 }));
    }

    #[tokio::test]
    async fn fail_all_propagates_error() {
        let correlator = Correlator::new();
        let (a, rx_a) = correlator.register("tools/call").await;
        let (_b, _rx_b) = correlator.register("tools/call").await;
        correlator.fail_all(TransportError::StreamClosed).await;
        let err = correlator
            .await_response(a, "tools/call", rx_a, None)
            .await
            .expect_err("closed");
        assert!(matches!(err, TransportError::StreamClosed));
        assert!(correlator.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_waiter_removes_its_entry() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.register("tools/call").await;

        // The caller gives up before any response arrives.
        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            correlator.await_response(id, "tools/call", rx, None),
        )
        .await;
        assert!(abandoned.is_err());

        assert!(!correlator.contains(id).await);
        assert!(!correlator.complete(id, Ok(Value::Null)).await);
    }

    #[tokio::test]
    async fn guard_drop_before_waiting_removes_entry() {
        let correlator = Correlator::new();
        let (id, _rx) = correlator.register("tools/call").await;
        drop(correlator.track(id));
        assert!(correlator.is_empty().await);
    }
}
