// src/notify/queue.rs
// Deferred dispatch task queue
//
// Enqueuing decouples the analysis run's completion from notification
// delivery latency. Tasks are independent: no ordering guarantee between
// channels, and one task's failure never affects another. Once enqueued a
// task cannot be withdrawn.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Channel;
use crate::analysis::{AnalysisResult, DiffPayload, ScrapeMetadata};
use crate::error::{PagewatchError, Result};

/// Context bundle handed to an external sender
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPayload {
    pub website_name: String,
    pub website_url: String,
    pub diff: DiffPayload,
    pub analysis: AnalysisResult,
    pub scrape: ScrapeMetadata,
}

/// One unit of deferred dispatch work, consumed exactly once by a sender
#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub channel: Channel,
    pub payload: DispatchPayload,
    /// Always zero today; honored by the worker if ever nonzero
    pub delay: Duration,
}

/// External sender for one notification channel (webhook or email).
/// Delivery success, failure, and retries are entirely its responsibility.
#[async_trait]
pub trait DispatchSender: Send + Sync {
    async fn send(&self, task: &DispatchTask) -> anyhow::Result<()>;
}

/// Producer handle for the dispatch queue
#[derive(Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<DispatchTask>,
}

impl DispatchQueue {
    /// Create a queue, returning the producer handle and the receiver to
    /// hand to [`spawn_dispatch_worker`]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue one task. Returns immediately; never waits for delivery.
    pub fn enqueue(&self, task: DispatchTask) -> Result<()> {
        self.tx
            .send(task)
            .map_err(|e| PagewatchError::Enqueue(e.to_string()))
    }
}

/// Spawn the worker that drains the queue and hands tasks to the matching
/// sender. Sender failures are logged and isolated per task. Stops when the
/// shutdown channel flips to true or the queue closes.
pub fn spawn_dispatch_worker(
    mut rx: mpsc::UnboundedReceiver<DispatchTask>,
    webhook: Arc<dyn DispatchSender>,
    email: Arc<dyn DispatchSender>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let task = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("dispatch worker shutting down");
                        break;
                    }
                    continue;
                }
                task = rx.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            if !task.delay.is_zero() {
                tokio::time::sleep(task.delay).await;
            }

            let sender = match task.channel {
                Channel::Webhook => &webhook,
                Channel::Email => &email,
            };

            debug!(channel = %task.channel, website = %task.payload.website_name, "dispatching task");
            if let Err(e) = sender.send(&task).await {
                warn!(channel = %task.channel, error = %e, "dispatch task failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Mutex;

    fn task(channel: Channel) -> DispatchTask {
        DispatchTask {
            channel,
            payload: DispatchPayload {
                website_name: "Shop".to_string(),
                website_url: "https://shop.example".to_string(),
                diff: DiffPayload {
                    text: "changed".to_string(),
                    json: json!({}),
                },
                analysis: AnalysisResult {
                    score: 85.0,
                    is_meaningful: true,
                    reasoning: "test".to_string(),
                    analyzed_at: Utc::now(),
                    model: "gpt-4o-mini".to_string(),
                },
                scrape: ScrapeMetadata::default(),
            },
            delay: Duration::ZERO,
        }
    }

    /// Sender recording the channels it was invoked for
    struct RecordingSender {
        seen: Mutex<Vec<Channel>>,
        fail: bool,
    }

    impl RecordingSender {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl DispatchSender for RecordingSender {
        async fn send(&self, task: &DispatchTask) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(task.channel);
            if self.fail {
                return Err(anyhow!("delivery failed"));
            }
            Ok(())
        }
    }

    // ============================================================================
    // Queue
    // ============================================================================

    #[test]
    fn test_enqueue_and_receive() {
        let (queue, mut rx) = DispatchQueue::new();
        queue.enqueue(task(Channel::Webhook)).unwrap();
        let received = rx.try_recv().unwrap();
        assert_eq!(received.channel, Channel::Webhook);
    }

    #[test]
    fn test_enqueue_after_close_is_error() {
        let (queue, rx) = DispatchQueue::new();
        drop(rx);
        let err = queue.enqueue(task(Channel::Email)).unwrap_err();
        assert!(matches!(err, PagewatchError::Enqueue(_)));
    }

    // ============================================================================
    // Worker
    // ============================================================================

    #[tokio::test]
    async fn test_worker_routes_tasks_to_matching_sender() {
        let (queue, rx) = DispatchQueue::new();
        let webhook = RecordingSender::new(false);
        let email = RecordingSender::new(false);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle =
            spawn_dispatch_worker(rx, webhook.clone(), email.clone(), shutdown_rx);

        queue.enqueue(task(Channel::Webhook)).unwrap();
        queue.enqueue(task(Channel::Email)).unwrap();
        queue.enqueue(task(Channel::Webhook)).unwrap();
        drop(queue); // close the queue so the worker drains and exits

        handle.await.unwrap();

        assert_eq!(
            *webhook.seen.lock().unwrap(),
            vec![Channel::Webhook, Channel::Webhook]
        );
        assert_eq!(*email.seen.lock().unwrap(), vec![Channel::Email]);
    }

    #[tokio::test]
    async fn test_worker_survives_failing_sender() {
        let (queue, rx) = DispatchQueue::new();
        let webhook = RecordingSender::new(true); // always fails
        let email = RecordingSender::new(false);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle =
            spawn_dispatch_worker(rx, webhook.clone(), email.clone(), shutdown_rx);

        queue.enqueue(task(Channel::Webhook)).unwrap();
        queue.enqueue(task(Channel::Email)).unwrap();
        drop(queue);

        handle.await.unwrap();

        // webhook failure did not prevent the email dispatch
        assert_eq!(webhook.seen.lock().unwrap().len(), 1);
        assert_eq!(email.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let (_queue, rx) = DispatchQueue::new();
        let webhook = RecordingSender::new(false);
        let email = RecordingSender::new(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn_dispatch_worker(rx, webhook, email, shutdown_rx);
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    // ============================================================================
    // Payload wire format
    // ============================================================================

    #[test]
    fn test_dispatch_payload_serializes_analysis_wire_names() {
        let value = serde_json::to_value(&task(Channel::Email).payload).unwrap();
        assert_eq!(value["websiteName"], "Shop");
        assert_eq!(value["analysis"]["meaningfulChangeScore"], 85.0);
        assert_eq!(value["analysis"]["isMeaningfulChange"], true);
        assert!(value["diff"]["text"].is_string());
        assert!(value.get("scrape").is_some());
    }
}
