use serde_json::json;

use crate::error::Error;
use crate::models::{NewNotification, Notification};
use crate::postgrest::CountOption;
use crate::realtime::{ChangeKind, DatabaseChanges, Subscription};
use crate::Marketplace;

pub const NOTIFICATIONS_TABLE: &str = "notifications";

/// How many notifications the bell dropdown loads
pub const NOTIFICATION_LIMIT: usize = 50;

/// Repository for the `notifications` table
pub struct Notifications<'a> {
    market: &'a Marketplace,
}

impl<'a> Notifications<'a> {
    pub(crate) fn new(market: &'a Marketplace) -> Self {
        Self { market }
    }

    /// The latest notifications, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<Notification>, Error> {
        self.market
            .from(NOTIFICATIONS_TABLE)
            .await?
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", false)
            .limit(NOTIFICATION_LIMIT)
            .execute()
            .await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize, Error> {
        let counted = self
            .market
            .from(NOTIFICATIONS_TABLE)
            .await?
            .select("id")
            .eq("user_id", user_id)
            .eq("is_read", false)
            .count(CountOption::Exact)
            .limit(1)
            .execute_counted::<serde_json::Value>()
            .await?;
        Ok(counted.total.unwrap_or(counted.rows.len()))
    }

    pub async fn create(&self, notification: &NewNotification) -> Result<(), Error> {
        self.market
            .from(NOTIFICATIONS_TABLE)
            .await?
            .insert(notification)
            .execute_no_return()
            .await
    }

    pub async fn mark_read(&self, id: &str) -> Result<(), Error> {
        self.market
            .from(NOTIFICATIONS_TABLE)
            .await?
            .update(json!({ "is_read": true }))
            .eq("id", id)
            .execute_no_return()
            .await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<(), Error> {
        self.market
            .from(NOTIFICATIONS_TABLE)
            .await?
            .update(json!({ "is_read": true }))
            .eq("user_id", user_id)
            .eq("is_read", false)
            .execute_no_return()
            .await
    }

    /// New notifications for `user_id` as they are inserted
    pub async fn subscribe(&self, user_id: &str) -> Result<Subscription, Error> {
        let changes = DatabaseChanges::new(NOTIFICATIONS_TABLE)
            .schema(&self.market.options.db_schema)
            .event(ChangeKind::Insert)
            .eq("user_id", user_id);
        self.market.realtime().await?.subscribe(changes).await
    }
}
