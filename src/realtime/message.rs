//! Wire messages of the realtime socket

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Error;

/// A message sent or received over the socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub message_ref: Option<String>,
}

pub(crate) const PHX_JOIN: &str = "phx_join";
pub(crate) const PHX_LEAVE: &str = "phx_leave";
pub(crate) const PHX_REPLY: &str = "phx_reply";
pub(crate) const PHX_ERROR: &str = "phx_error";
pub(crate) const PHX_CLOSE: &str = "phx_close";
pub(crate) const HEARTBEAT: &str = "heartbeat";
pub(crate) const POSTGRES_CHANGES: &str = "postgres_changes";

impl RealtimeMessage {
    pub fn new(topic: &str, event: &str, payload: Value, message_ref: String) -> Self {
        Self {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
            message_ref: Some(message_ref),
        }
    }

    pub fn heartbeat(message_ref: String) -> Self {
        Self::new("phoenix", HEARTBEAT, json!({}), message_ref)
    }

    /// `Some(reason)` when this is a rejected join reply
    pub fn reply_error(&self) -> Option<String> {
        if self.event != PHX_REPLY {
            return None;
        }
        match self.payload.get("status").and_then(Value::as_str) {
            Some("ok") | None => None,
            Some(_) => Some(
                self.payload
                    .pointer("/response/reason")
                    .and_then(Value::as_str)
                    .unwrap_or("join rejected")
                    .to_string(),
            ),
        }
    }
}

/// Which row changes to listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::All => "*",
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

/// A row change delivered by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub schema: String,
    pub table: String,
    pub commit_timestamp: Option<String>,
    #[serde(default)]
    pub record: Value,
    #[serde(default)]
    pub old_record: Value,
}

impl ChangeEvent {
    /// Decode the new row into a record type
    pub fn record_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_value(self.record.clone())?)
    }

    /// Pull the change out of a `postgres_changes` message
    pub(crate) fn from_message(message: &RealtimeMessage) -> Option<Result<Self, Error>> {
        if message.event != POSTGRES_CHANGES {
            return None;
        }
        let data = message.payload.get("data")?.clone();
        Some(serde_json::from_value(data).map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_postgres_change() {
        let raw = r#"{
            "topic": "realtime:public:notifications",
            "event": "postgres_changes",
            "payload": {
                "ids": [1],
                "data": {
                    "schema": "public",
                    "table": "notifications",
                    "commit_timestamp": "2026-10-01T10:00:00Z",
                    "type": "INSERT",
                    "record": {"id": "n1", "user_id": "u1", "title": "New message"},
                    "columns": []
                }
            },
            "ref": null
        }"#;
        let message: RealtimeMessage = serde_json::from_str(raw).unwrap();
        let change = ChangeEvent::from_message(&message).unwrap().unwrap();
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.table, "notifications");
        assert_eq!(change.record["title"], "New message");
        assert!(change.old_record.is_null());
    }

    #[test]
    fn rejected_join_reports_reason() {
        let message = RealtimeMessage::new(
            "realtime:public:products",
            PHX_REPLY,
            json!({"status": "error", "response": {"reason": "unauthorized"}}),
            "1".into(),
        );
        assert_eq!(message.reply_error().as_deref(), Some("unauthorized"));

        let ok = RealtimeMessage::new("t", PHX_REPLY, json!({"status": "ok"}), "2".into());
        assert_eq!(ok.reply_error(), None);
    }

    #[test]
    fn heartbeat_shape() {
        let value = serde_json::to_value(RealtimeMessage::heartbeat("7".into())).unwrap();
        assert_eq!(
            value,
            json!({"topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": "7"})
        );
    }
}
