use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tavolo_core::notify::{NotificationEvent, NotificationSink, NotifyError};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Supervised worker pool in front of the notification sink.
///
/// Events are queued on a bounded channel and drained by a fixed set of
/// workers. A sink failure is logged and isolated to that one delivery; a full
/// queue drops the event and counts the drop. Nothing on this path can block
/// or fail the state transition that produced the event.
pub struct NotificationDispatcher {
    tx: Mutex<Option<mpsc::Sender<NotificationEvent>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl NotificationDispatcher {
    pub fn start(sink: Arc<dyn NotificationSink>, queue_capacity: usize, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::new();
        for worker_id in 0..workers.max(1) {
            let rx = rx.clone();
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let event = { rx.lock().await.recv().await };
                    let Some(event) = event else { break };
                    if let Err(err) = sink.deliver(&event).await {
                        tracing::warn!(worker_id, error = %err, "notification delivery failed");
                    }
                }
                tracing::debug!(worker_id, "notification worker stopped");
            }));
        }

        Self {
            tx: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
            dropped: AtomicU64::new(0),
        }
    }

    /// Fire-and-forget: enqueue an event for the workers. Never fails the caller.
    pub async fn dispatch(&self, event: NotificationEvent) {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => {
                if let Err(err) = tx.try_send(event) {
                    self.dropped.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(error = %err, "notification queue full, event dropped");
                }
            }
            None => {
                self.dropped.fetch_add(1, Ordering::SeqCst);
                tracing::warn!("notification dispatcher already stopped, event dropped");
            }
        }
    }

    /// Events dropped because the queue was full or the dispatcher stopped
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Close the queue and wait for the workers to drain it
    pub async fn shutdown(&self) {
        let tx = self.tx.lock().await.take();
        drop(tx);

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Sink that just logs; the default until a real dispatch service is wired in
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        tracing::info!(event = ?event, "notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tavolo_shared::models::events::OrderPlacedEvent;
    use uuid::Uuid;

    struct RecordingSink {
        delivered: Mutex<Vec<NotificationEvent>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
            self.delivered.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn deliver(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
            Err(NotifyError::DeliveryFailed("smtp down".to_string()))
        }
    }

    fn placed_event() -> NotificationEvent {
        NotificationEvent::OrderPlaced(OrderPlacedEvent {
            order_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            fulfillment: "PICKUP".to_string(),
            total_cents: 2000,
            timestamp: 0,
        })
    }

    #[tokio::test]
    async fn test_events_reach_the_sink() {
        let sink = Arc::new(RecordingSink { delivered: Mutex::new(Vec::new()) });
        let dispatcher = NotificationDispatcher::start(sink.clone(), 16, 2);

        for _ in 0..5 {
            dispatcher.dispatch(placed_event()).await;
        }
        dispatcher.shutdown().await;

        assert_eq!(sink.delivered.lock().await.len(), 5);
        assert_eq!(dispatcher.dropped(), 0);
    }

    #[tokio::test]
    async fn test_sink_failures_never_surface_to_the_caller() {
        let dispatcher = NotificationDispatcher::start(Arc::new(FailingSink), 16, 1);

        // dispatch has no error to return; failures stay inside the workers
        dispatcher.dispatch(placed_event()).await;
        dispatcher.dispatch(placed_event()).await;
        dispatcher.shutdown().await;
        assert_eq!(dispatcher.dropped(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        // a sink that never finishes keeps the single worker busy
        struct StuckSink;

        #[async_trait]
        impl NotificationSink for StuckSink {
            async fn deliver(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let dispatcher = NotificationDispatcher::start(Arc::new(StuckSink), 1, 1);

        // worker grabs the first event, the second fills the queue, the rest drop
        for _ in 0..4 {
            dispatcher.dispatch(placed_event()).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(dispatcher.dropped() >= 1);
    }
}
