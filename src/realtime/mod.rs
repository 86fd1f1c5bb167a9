//! Realtime change notifications over the Phoenix socket

mod message;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;

pub use message::*;

const EVENT_BUFFER: usize = 64;
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// Client for realtime subscriptions
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    url: String,
    key: String,
    token: String,
    heartbeat_interval: Duration,
    next_ref: Arc<AtomicU32>,
}

/// The row changes a subscription asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseChanges {
    pub schema: String,
    pub table: String,
    pub event: ChangeKind,
    pub filter: Option<String>,
}

impl DatabaseChanges {
    /// Every change on a table of the public schema
    pub fn new(table: &str) -> Self {
        Self {
            schema: "public".to_string(),
            table: table.to_string(),
            event: ChangeKind::All,
            filter: None,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn event(mut self, event: ChangeKind) -> Self {
        self.event = event;
        self
    }

    /// Only rows whose column equals the value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.filter = Some(format!("{}=eq.{}", column, value.to_string()));
        self
    }

    /// The channel topic, `realtime:{schema}:{table}[:{filter}]`
    pub fn topic(&self) -> String {
        match &self.filter {
            Some(filter) => format!("realtime:{}:{}:{}", self.schema, self.table, filter),
            None => format!("realtime:{}:{}", self.schema, self.table),
        }
    }

    fn join_payload(&self, token: &str) -> serde_json::Value {
        let mut change = json!({
            "event": self.event.as_str(),
            "schema": self.schema,
            "table": self.table,
        });
        if let Some(filter) = &self.filter {
            change["filter"] = json!(filter);
        }
        json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [change],
            },
            "access_token": token,
        })
    }
}

/// A live subscription; dropping it closes the socket
pub struct Subscription {
    topic: String,
    events: mpsc::Receiver<ChangeEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next change; `None` once the connection is gone
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Leave the channel and wait for the socket task to finish
    pub async fn unsubscribe(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("realtime task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl RealtimeClient {
    pub(crate) fn new(url: &str, key: &str, token: &str, heartbeat_interval: Duration) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            token: token.to_string(),
            heartbeat_interval: if heartbeat_interval.is_zero() {
                DEFAULT_HEARTBEAT
            } else {
                heartbeat_interval
            },
            next_ref: Arc::new(AtomicU32::new(1)),
        }
    }

    fn next_ref(&self) -> String {
        self.next_ref.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Get the WebSocket URL for the realtime API
    pub fn get_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(Error::realtime(format!("unsupported URL scheme: {other}"))),
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::realtime("cannot switch URL to a websocket scheme"))?;
        url.set_path("/realtime/v1/websocket");
        url.query_pairs_mut()
            .clear()
            .append_pair("apikey", &self.key)
            .append_pair("vsn", "1.0.0");
        Ok(url)
    }

    /// Open a socket, join the channel for `changes` and start forwarding events
    pub async fn subscribe(&self, changes: DatabaseChanges) -> Result<Subscription, Error> {
        let url = self.get_url()?;
        let topic = changes.topic();
        info!(%topic, "opening realtime connection");

        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::realtime(format!("WebSocket connection failed: {e}")))?;
        let (mut write, mut read) = stream.split();

        let join_ref = self.next_ref();
        let join = RealtimeMessage::new(
            &topic,
            PHX_JOIN,
            changes.join_payload(&self.token),
            join_ref.clone(),
        );
        write
            .send(Message::Text(serde_json::to_string(&join)?))
            .await
            .map_err(|e| Error::realtime(format!("join failed: {e}")))?;

        let reply = await_join_reply(&mut read, &topic, &join_ref);
        let pending = tokio::time::timeout(JOIN_TIMEOUT, reply)
            .await
            .map_err(|_| Error::realtime(format!("no reply to joining {topic}")))??;
        debug!(%topic, "channel joined");

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let client = self.clone();
        let task_topic = topic.clone();

        let task = tokio::spawn(async move {
            for message in pending {
                if !client.dispatch(&task_topic, message, &events_tx).await {
                    return;
                }
            }

            let mut heartbeat = tokio::time::interval(client.heartbeat_interval);
            heartbeat.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        debug!(topic = %task_topic, "leaving channel");
                        let leave = RealtimeMessage::new(
                            &task_topic,
                            PHX_LEAVE,
                            json!({}),
                            client.next_ref(),
                        );
                        if let Ok(text) = serde_json::to_string(&leave) {
                            let _ = write.send(Message::Text(text)).await;
                        }
                        let _ = write.close().await;
                        break;
                    }
                    _ = heartbeat.tick() => {
                        trace!("sending heartbeat");
                        let beat = RealtimeMessage::heartbeat(client.next_ref());
                        let Ok(text) = serde_json::to_string(&beat) else { continue };
                        if let Err(e) = write.send(Message::Text(text)).await {
                            error!("heartbeat failed, assuming connection lost: {e}");
                            break;
                        }
                    }
                    incoming = read.next() => {
                        let text = match incoming {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(Message::Close(_))) | None => {
                                info!(topic = %task_topic, "realtime connection closed");
                                break;
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => {
                                error!("realtime read error: {e}");
                                break;
                            }
                        };
                        let message = match serde_json::from_str::<RealtimeMessage>(&text) {
                            Ok(message) => message,
                            Err(e) => {
                                warn!("unparsable realtime message: {e}");
                                continue;
                            }
                        };
                        if !client.dispatch(&task_topic, message, &events_tx).await {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Subscription {
            topic,
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Route one incoming message; `false` ends the connection
    async fn dispatch(
        &self,
        topic: &str,
        message: RealtimeMessage,
        events: &mpsc::Sender<ChangeEvent>,
    ) -> bool {
        if message.topic != topic {
            trace!(topic = %message.topic, "ignoring message for other topic");
            return true;
        }
        if let Some(reason) = message.reply_error() {
            error!(%topic, %reason, "channel reply rejected");
            return false;
        }
        if message.event == PHX_ERROR || message.event == PHX_CLOSE {
            warn!(%topic, event = %message.event, "channel closed by server");
            return false;
        }

        match ChangeEvent::from_message(&message) {
            Some(Ok(change)) => events.send(change).await.is_ok(),
            Some(Err(e)) => {
                warn!("malformed change payload: {e}");
                true
            }
            None => true,
        }
    }
}

/// Read until the server answers the join with `join_ref`.
///
/// Messages that arrive first are handed back so no change is lost.
async fn await_join_reply<S>(
    read: &mut S,
    topic: &str,
    join_ref: &str,
) -> Result<Vec<RealtimeMessage>, Error>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let mut pending = Vec::new();
    while let Some(frame) = read.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => return Err(Error::realtime(format!("join failed: {e}"))),
        };
        let message = match serde_json::from_str::<RealtimeMessage>(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("unparsable realtime message: {e}");
                continue;
            }
        };
        let is_join_reply = message.event == PHX_REPLY
            && message.topic == topic
            && message.message_ref.as_deref() == Some(join_ref);
        if !is_join_reply {
            pending.push(message);
            continue;
        }
        return match message.reply_error() {
            Some(reason) => {
                error!(%topic, %reason, "channel join rejected");
                Err(Error::realtime(format!("joining {topic} was rejected: {reason}")))
            }
            None => Ok(pending),
        };
    }
    Err(Error::realtime(format!("connection closed before joining {topic}")))
}
