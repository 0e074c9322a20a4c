use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::TaskHandler;
use crate::message_queue::MessageQueue;
use crate::metrics::TASKS_PROCESSED;

/// Polls each registered topic and dispatches messages to their handler
pub struct TaskWorker {
    queue: Arc<dyn MessageQueue>,
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
    poll_interval: Duration,
}

impl TaskWorker {
    pub fn new(queue: Arc<dyn MessageQueue>, poll_interval: Duration) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            poll_interval,
        }
    }

    pub fn register(mut self, task: &'static str, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task, handler);
        self
    }

    /// Handles at most one message per topic. Returns how many were taken.
    pub async fn process_once(&self) -> usize {
        let mut taken = 0;
        for (&task, handler) in &self.handlers {
            let message = match self.queue.subscribe(task).await {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(e) => {
                    error!(task, error = %e, "failed to poll task queue");
                    continue;
                }
            };
            taken += 1;

            let outcome = match handler.handle(message.payload.clone()).await {
                Ok(result) => {
                    info!(task, id = %message.id, success = result.success, message = %result.message, "task finished");
                    if let Err(e) = self.queue.ack(&message.id).await {
                        warn!(task, id = %message.id, error = %e, "ack failed");
                    }
                    if result.success { "success" } else { "failure" }
                }
                Err(e) => {
                    warn!(task, id = %message.id, retry = message.retry_count, error = %e, "task failed");
                    if let Err(e) = self.queue.nack(&message.id).await {
                        warn!(task, id = %message.id, error = %e, "nack failed");
                    }
                    "error"
                }
            };
            TASKS_PROCESSED.with_label_values(&[task, outcome]).inc();
        }
        taken
    }

    /// Runs until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(topics = ?self.handlers.keys().collect::<Vec<_>>(), "task worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            if self.process_once().await > 0 {
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("task worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use crate::message_queue::{InMemoryMessageQueue, Message};
    use crate::tasks::TaskResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl TaskHandler for Flaky {
        async fn handle(&self, _payload: serde_json::Value) -> Result<TaskResult, ServiceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(ServiceError::ExternalServiceError("smtp down".into()))
            } else {
                Ok(TaskResult::ok("done"))
            }
        }
    }

    #[tokio::test]
    async fn failed_task_is_retried_then_acked() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        queue.publish(Message::new("t", json!({}))).await.unwrap();
        let handler = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
            fail_first: 1,
        });
        let worker = TaskWorker::new(queue.clone(), Duration::from_millis(10))
            .register("t", handler.clone());

        assert_eq!(worker.process_once().await, 1);
        assert_eq!(queue.pending("t").len(), 1);
        assert_eq!(worker.process_once().await, 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert!(queue.pending("t").is_empty());
        assert_eq!(queue.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        let worker = TaskWorker::new(queue, Duration::from_millis(5));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
