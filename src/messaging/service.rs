use std::sync::Arc;
use tracing::info;

use crate::clock::Clock;
use crate::db::models::{Message, UserId};
use crate::db::{AccountStore, MessageLog};
use crate::error::MessagingError;

/// Two-party conversations on top of the message log.
///
/// `sender_id` is always the authenticated caller; handlers pass the id
/// produced by the authenticator, never one taken from the request body.
pub struct ConversationService {
    accounts: Arc<AccountStore>,
    messages: Arc<MessageLog>,
    clock: Arc<dyn Clock>,
}

impl ConversationService {
    pub fn new(accounts: Arc<AccountStore>, messages: Arc<MessageLog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts,
            messages,
            clock,
        }
    }

    pub async fn send(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
    ) -> Result<Message, MessagingError> {
        if content.trim().is_empty() {
            return Err(MessagingError::EmptyContent);
        }
        if receiver_id == sender_id || !self.accounts.exists(receiver_id).await {
            return Err(MessagingError::InvalidRecipient);
        }

        let message = self
            .messages
            .append(sender_id, receiver_id, content.to_string(), self.clock.now())
            .await;
        info!("Message {} sent from user {} to user {}", message.id, sender_id, receiver_id);
        Ok(message)
    }

    /// Every message between the two users, oldest first. The result is the
    /// same whichever side asks.
    pub async fn conversation(&self, caller_id: UserId, counterpart_id: UserId) -> Vec<Message> {
        self.messages.between(caller_id, counterpart_id).await
    }
}
