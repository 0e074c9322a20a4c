/*!
 * # Message Queue
 *
 * Topic queues carrying background task payloads. A consumer `subscribe`s to
 * take the next message, then `ack`s it or `nack`s it back onto the queue.
 * A message that has been nacked `max_retries` times is dead-lettered.
 */

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_SIZE: usize = 1000;

#[derive(Error, Debug)]
pub enum MessageQueueError {
    #[error("Queue is full")]
    QueueFull,
    #[error("Unknown message: {0}")]
    UnknownMessage(Uuid),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<serde_json::Error> for MessageQueueError {
    fn from(err: serde_json::Error) -> Self {
        MessageQueueError::SerializationError(err.to_string())
    }
}

impl From<redis::RedisError> for MessageQueueError {
    fn from(err: redis::RedisError) -> Self {
        MessageQueueError::ConnectionError(err.to_string())
    }
}

/// Message envelope for queue items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub topic: String,
    pub payload: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            payload,
            timestamp: chrono::Utc::now(),
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Records a failed attempt. Returns false once retries are used up.
    fn retry(&mut self) -> bool {
        self.retry_count += 1;
        self.retry_count < self.max_retries
    }
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError>;
    async fn subscribe(&self, topic: &str) -> Result<Option<Message>, MessageQueueError>;
    async fn ack(&self, message_id: &Uuid) -> Result<(), MessageQueueError>;
    async fn nack(&self, message_id: &Uuid) -> Result<(), MessageQueueError>;
}

/// In-memory message queue implementation
#[derive(Debug)]
pub struct InMemoryMessageQueue {
    queues: Mutex<HashMap<String, VecDeque<Message>>>,
    in_flight: DashMap<Uuid, Message>,
    dead_letters: Mutex<Vec<Message>>,
    max_size: usize,
}

impl Default for InMemoryMessageQueue {
    fn default() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            in_flight: DashMap::new(),
            dead_letters: Mutex::new(Vec::new()),
            max_size,
        }
    }

    fn lock_queues(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, VecDeque<Message>>>, MessageQueueError>
    {
        self.queues
            .lock()
            .map_err(|_| MessageQueueError::ConnectionError("queue lock poisoned".into()))
    }

    /// Messages waiting on `topic`, oldest first
    pub fn pending(&self, topic: &str) -> Vec<Message> {
        self.queues
            .lock()
            .ok()
            .and_then(|q| q.get(topic).map(|q| q.iter().cloned().collect()))
            .unwrap_or_default()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn dead_letters(&self) -> Vec<Message> {
        self.dead_letters
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError> {
        let mut queues = self.lock_queues()?;
        let queue = queues.entry(message.topic.clone()).or_default();

        if queue.len() >= self.max_size {
            return Err(MessageQueueError::QueueFull);
        }

        debug!(topic = %message.topic, id = %message.id, "message published");
        queue.push_back(message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Option<Message>, MessageQueueError> {
        let next = self.lock_queues()?.get_mut(topic).and_then(VecDeque::pop_front);
        if let Some(message) = &next {
            self.in_flight.insert(message.id, message.clone());
        }
        Ok(next)
    }

    async fn ack(&self, message_id: &Uuid) -> Result<(), MessageQueueError> {
        self.in_flight
            .remove(message_id)
            .map(|_| ())
            .ok_or(MessageQueueError::UnknownMessage(*message_id))
    }

    async fn nack(&self, message_id: &Uuid) -> Result<(), MessageQueueError> {
        let (_, mut message) = self
            .in_flight
            .remove(message_id)
            .ok_or(MessageQueueError::UnknownMessage(*message_id))?;

        if message.retry() {
            let mut queues = self.lock_queues()?;
            queues
                .entry(message.topic.clone())
                .or_default()
                .push_back(message);
        } else {
            warn!(topic = %message.topic, id = %message.id, "message dead-lettered after retries");
            if let Ok(mut dead) = self.dead_letters.lock() {
                dead.push(message);
            }
        }
        Ok(())
    }
}

/// Redis-backed queue: one list per topic plus an in-flight hash
#[derive(Clone)]
pub struct RedisMessageQueue {
    client: redis::Client,
    namespace: String,
}

impl RedisMessageQueue {
    pub fn new(redis_url: &str, namespace: impl Into<String>) -> Result<Self, MessageQueueError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    fn topic_key(&self, topic: &str) -> String {
        format!("{}:{}", self.namespace, topic)
    }

    fn in_flight_key(&self) -> String {
        format!("{}:in-flight", self.namespace)
    }

    fn dead_letter_key(&self) -> String {
        format!("{}:dead", self.namespace)
    }
}

#[async_trait]
impl MessageQueue for RedisMessageQueue {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let body = serde_json::to_string(&message)?;
        let _: () = redis::cmd("LPUSH")
            .arg(self.topic_key(&message.topic))
            .arg(body)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Option<Message>, MessageQueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let body: Option<String> = redis::cmd("RPOP")
            .arg(self.topic_key(topic))
            .query_async(&mut conn)
            .await?;
        let Some(body) = body else {
            return Ok(None);
        };
        let message: Message = serde_json::from_str(&body)?;
        let _: () = redis::cmd("HSET")
            .arg(self.in_flight_key())
            .arg(message.id.to_string())
            .arg(body)
            .query_async(&mut conn)
            .await?;
        Ok(Some(message))
    }

    async fn ack(&self, message_id: &Uuid) -> Result<(), MessageQueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let removed: i64 = redis::cmd("HDEL")
            .arg(self.in_flight_key())
            .arg(message_id.to_string())
            .query_async(&mut conn)
            .await?;
        if removed == 0 {
            return Err(MessageQueueError::UnknownMessage(*message_id));
        }
        Ok(())
    }

    async fn nack(&self, message_id: &Uuid) -> Result<(), MessageQueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let body: Option<String> = redis::cmd("HGET")
            .arg(self.in_flight_key())
            .arg(message_id.to_string())
            .query_async(&mut conn)
            .await?;
        let body = body.ok_or(MessageQueueError::UnknownMessage(*message_id))?;
        let mut message: Message = serde_json::from_str(&body)?;

        let target = if message.retry() {
            self.topic_key(&message.topic)
        } else {
            warn!(topic = %message.topic, id = %message.id, "message dead-lettered after retries");
            self.dead_letter_key()
        };
        // requeued messages go to the consuming end
        let _: () = redis::cmd("RPUSH")
            .arg(target)
            .arg(serde_json::to_string(&message)?)
            .query_async(&mut conn)
            .await?;
        let _: () = redis::cmd("HDEL")
            .arg(self.in_flight_key())
            .arg(message_id.to_string())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn publish_subscribe_ack() {
        let queue = InMemoryMessageQueue::new();
        queue
            .publish(Message::new("send-email-resend", json!({"to": []})))
            .await
            .unwrap();

        let received = queue.subscribe("send-email-resend").await.unwrap().unwrap();
        assert_eq!(received.topic, "send-email-resend");
        assert_eq!(queue.in_flight_len(), 1);
        assert!(queue.subscribe("send-email-resend").await.unwrap().is_none());

        queue.ack(&received.id).await.unwrap();
        assert_eq!(queue.in_flight_len(), 0);
        assert_matches!(
            queue.ack(&received.id).await,
            Err(MessageQueueError::UnknownMessage(_))
        );
    }

    #[tokio::test]
    async fn nack_requeues_until_retries_are_exhausted() {
        let queue = InMemoryMessageQueue::new();
        queue
            .publish(Message::new("user-admin", json!({})).with_max_retries(2))
            .await
            .unwrap();

        let first = queue.subscribe("user-admin").await.unwrap().unwrap();
        queue.nack(&first.id).await.unwrap();
        let second = queue.subscribe("user-admin").await.unwrap().unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.retry_count, 1);

        queue.nack(&second.id).await.unwrap();
        assert!(queue.subscribe("user-admin").await.unwrap().is_none());
        assert_eq!(queue.dead_letters().len(), 1);
    }

    #[tokio::test]
    async fn full_queue_rejects_publish() {
        let queue = InMemoryMessageQueue::with_max_size(1);
        queue.publish(Message::new("t", json!(1))).await.unwrap();
        assert_matches!(
            queue.publish(Message::new("t", json!(2))).await,
            Err(MessageQueueError::QueueFull)
        );
    }
}
