use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{collect, Validate};
use crate::error::{Error, FieldError};

/// A row of the `messages` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub product_id: Option<String>,
    pub subject: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// The other side of the conversation from `user_id`'s point of view
    pub fn partner_of(&self, user_id: &str) -> &str {
        if self.sender_id == user_id {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

/// The compose form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
}

impl Validate for NewMessage {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();
        if self.receiver_id.trim().is_empty() {
            errors.push(FieldError::new("receiver_id", "is required"));
        } else if self.receiver_id == self.sender_id {
            errors.push(FieldError::new("receiver_id", "cannot message yourself"));
        }
        if self.content.trim().is_empty() {
            errors.push(FieldError::new("content", "is required"));
        }
        collect(errors)
    }
}

/// One thread of the inbox
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub partner_id: String,
    pub last_message: Message,
    pub unread: usize,
    pub total: usize,
}

/// Group messages into conversations, most recent thread first
pub fn conversations(user_id: &str, messages: &[Message]) -> Vec<Conversation> {
    let mut threads: Vec<Conversation> = Vec::new();

    for message in messages {
        let partner = message.partner_of(user_id);
        let unread = usize::from(message.receiver_id == user_id && !message.is_read);

        match threads.iter_mut().find(|t| t.partner_id == partner) {
            Some(thread) => {
                thread.total += 1;
                thread.unread += unread;
                if message.created_at > thread.last_message.created_at {
                    thread.last_message = message.clone();
                }
            }
            None => threads.push(Conversation {
                partner_id: partner.to_string(),
                last_message: message.clone(),
                unread,
                total: 1,
            }),
        }
    }

    threads.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    threads
}
