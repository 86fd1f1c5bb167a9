use tracing::{debug, warn};

use super::first_row;
use crate::error::Error;
use crate::models::{
    conversations, Conversation, Message, NewMessage, NewNotification, NotificationKind, Validate,
};
use crate::postgrest::{CountOption, Filter, FilterOperator};
use crate::Marketplace;

pub const MESSAGES_TABLE: &str = "messages";

/// Repository for the `messages` table
pub struct Messages<'a> {
    market: &'a Marketplace,
}

fn involving(user_id: &str) -> [Filter; 2] {
    [
        Filter::new("sender_id", FilterOperator::Eq, user_id),
        Filter::new("receiver_id", FilterOperator::Eq, user_id),
    ]
}

impl<'a> Messages<'a> {
    pub(crate) fn new(market: &'a Marketplace) -> Self {
        Self { market }
    }

    /// Everything the user sent or received, newest first
    pub async fn inbox(&self, user_id: &str) -> Result<Vec<Message>, Error> {
        self.market
            .from(MESSAGES_TABLE)
            .await?
            .select("*")
            .or(&involving(user_id))
            .order("created_at", false)
            .execute()
            .await
    }

    /// The inbox grouped per partner, most recent thread first
    pub async fn conversations(&self, user_id: &str) -> Result<Vec<Conversation>, Error> {
        let messages = self.inbox(user_id).await?;
        Ok(conversations(user_id, &messages))
    }

    /// The messages between two users, oldest first
    pub async fn thread(&self, user_id: &str, partner_id: &str) -> Result<Vec<Message>, Error> {
        self.market
            .from(MESSAGES_TABLE)
            .await?
            .select("*")
            .or(&involving(user_id))
            .or(&involving(partner_id))
            .order("created_at", true)
            .execute()
            .await
    }

    /// Send a message and let the receiver know
    pub async fn send(&self, message: &NewMessage) -> Result<Message, Error> {
        message.validate()?;
        let rows = self
            .market
            .from(MESSAGES_TABLE)
            .await?
            .insert(message)
            .execute()
            .await?;
        let sent: Message = first_row(rows, "message insert")?;
        debug!(message = %sent.id, "message sent");

        let notice = NewNotification {
            user_id: sent.receiver_id.clone(),
            kind: NotificationKind::Message,
            title: sent.subject.clone().unwrap_or_else(|| "New message".to_string()),
            body: Some(sent.content.chars().take(140).collect()),
            link: Some(format!("/messages?with={}", sent.sender_id)),
        };
        if let Err(e) = self.market.notifications().create(&notice).await {
            warn!(message = %sent.id, "could not notify receiver: {e}");
        }
        Ok(sent)
    }

    /// Mark what `partner_id` sent to `user_id` as read
    pub async fn mark_thread_read(&self, user_id: &str, partner_id: &str) -> Result<(), Error> {
        self.market
            .from(MESSAGES_TABLE)
            .await?
            .update(serde_json::json!({ "is_read": true }))
            .eq("receiver_id", user_id)
            .eq("sender_id", partner_id)
            .eq("is_read", false)
            .execute_no_return()
            .await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize, Error> {
        let counted = self
            .market
            .from(MESSAGES_TABLE)
            .await?
            .select("id")
            .eq("receiver_id", user_id)
            .eq("is_read", false)
            .count(CountOption::Exact)
            .limit(1)
            .execute_counted::<serde_json::Value>()
            .await?;
        Ok(counted.total.unwrap_or(counted.rows.len()))
    }
}
