use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::models::{Message, MessageId, UserId};

/// Append-only message log. Insertion order is chronological order.
///
/// Nothing is ever evicted, so memory grows with traffic for the lifetime of
/// the process.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: DateTime<Utc>,
    ) -> Message {
        let mut messages = self.messages.write().await;
        // Keep timestamps monotonic even if the clock steps backwards.
        let timestamp = messages
            .last()
            .map_or(timestamp, |last| timestamp.max(last.timestamp));

        let message = Message {
            id: messages.len() as MessageId + 1,
            sender_id,
            receiver_id,
            content,
            timestamp,
        };
        messages.push(message.clone());
        message
    }

    /// Snapshot of every message exchanged between `a` and `b`, oldest first.
    pub async fn between(&self, a: UserId, b: UserId) -> Vec<Message> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }
}
