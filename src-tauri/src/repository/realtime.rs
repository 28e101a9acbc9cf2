//! Realtime Change Feed
//!
//! Phoenix-channel client for the hosted realtime service. One websocket per
//! subscription: join `realtime:todos_changes` for every postgres change on
//! `public.todos`, heartbeat on the `phoenix` topic, push the new access
//! token whenever the session is refreshed, leave when the receiver is
//! dropped.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::change::ChangeEvent;
use super::traits::{ChangeFeed, ChangeReceiver};
use crate::config::RemoteConfig;
use crate::domain::{DomainError, DomainResult};
use crate::session::SessionWatch;

pub const CHANNEL_TOPIC: &str = "realtime:todos_changes";
const HEARTBEAT_TOPIC: &str = "phoenix";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const JOIN_REF: &str = "1";

pub struct RealtimeFeed {
    config: RemoteConfig,
    session: SessionWatch,
}

impl RealtimeFeed {
    pub fn new(config: RemoteConfig, session: SessionWatch) -> Self {
        Self { config, session }
    }

    fn access_token(&self) -> String {
        current_token(&self.session, &self.config.anon_key)
    }
}

fn current_token(session: &SessionWatch, anon_key: &str) -> String {
    session
        .borrow()
        .as_ref()
        .map(|s| s.access_token.clone())
        .unwrap_or_else(|| anon_key.to_string())
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    async fn subscribe(&self) -> DomainResult<ChangeReceiver> {
        let (socket, _) = tokio_tungstenite::connect_async(self.config.realtime_url())
            .await
            .map_err(|e| DomainError::Transport(format!("realtime connect: {}", e)))?;
        let (mut sink, mut stream) = socket.split();

        let mut token = self.access_token();
        let join = join_message(&token);
        sink.send(Message::Text(join.to_string().into()))
            .await
            .map_err(|e| DomainError::Transport(format!("realtime join: {}", e)))?;

        // Wait for the join reply before handing out the receiver
        let reply = tokio::time::timeout(JOIN_TIMEOUT, async {
            while let Some(message) = stream.next().await {
                let message =
                    message.map_err(|e| DomainError::Transport(format!("realtime: {}", e)))?;
                let Message::Text(text) = message else {
                    continue;
                };
                if let Frame::Reply { reference, ok, response } = decode_frame(&text) {
                    if reference.as_deref() == Some(JOIN_REF) {
                        return if ok {
                            Ok(())
                        } else {
                            Err(DomainError::Remote(format!("channel join refused: {}", response)))
                        };
                    }
                }
            }
            Err(DomainError::Transport("socket closed during join".to_string()))
        })
        .await
        .map_err(|_| DomainError::Transport("channel join timed out".to_string()))?;
        reply?;

        log::info!("[REALTIME] joined {}", CHANNEL_TOPIC);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = self.session.clone();
        let anon_key = self.config.anon_key.clone();
        tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await; // skip immediate first tick
            let mut next_ref: u64 = 2;
            let mut watching_session = true;

            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        let leave = control_message(CHANNEL_TOPIC, "phx_leave", next_ref);
                        let _ = sink.send(Message::Text(leave.to_string().into())).await;
                        let _ = sink.close().await;
                        log::info!("[REALTIME] left {}", CHANNEL_TOPIC);
                        break;
                    }
                    changed = session.changed(), if watching_session => {
                        if changed.is_err() {
                            watching_session = false;
                            continue;
                        }
                        let fresh = current_token(&session, &anon_key);
                        if fresh == token {
                            continue;
                        }
                        token = fresh;
                        let update = access_token_message(&token, next_ref);
                        next_ref += 1;
                        if sink.send(Message::Text(update.to_string().into())).await.is_err() {
                            log::warn!("[REALTIME] token update failed, connection dead");
                            break;
                        }
                        log::info!("[REALTIME] access token updated");
                    }
                    _ = heartbeat.tick() => {
                        let beat = control_message(HEARTBEAT_TOPIC, "heartbeat", next_ref);
                        next_ref += 1;
                        if sink.send(Message::Text(beat.to_string().into())).await.is_err() {
                            log::warn!("[REALTIME] heartbeat failed, connection dead");
                            break;
                        }
                    }
                    message = stream.next() => match message {
                        Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                            Frame::Change(event) => {
                                if tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Frame::Closed(reason) => {
                                log::warn!("[REALTIME] channel closed by server: {}", reason);
                                break;
                            }
                            Frame::Reply { .. } | Frame::Ignored => {}
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            log::warn!("[REALTIME] socket closed");
                            break;
                        }
                        Some(Err(e)) => {
                            log::warn!("[REALTIME] socket error: {}", e);
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn join_message(access_token: &str) -> Value {
    json!({
        "topic": CHANNEL_TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": "todos" }
                ]
            },
            "access_token": access_token
        },
        "ref": JOIN_REF,
        "join_ref": JOIN_REF
    })
}

/// Re-authorizes the joined channel without rejoining it
fn access_token_message(access_token: &str, reference: u64) -> Value {
    json!({
        "topic": CHANNEL_TOPIC,
        "event": "access_token",
        "payload": { "access_token": access_token },
        "ref": reference.to_string()
    })
}

fn control_message(topic: &str, event: &str, reference: u64) -> Value {
    json!({
        "topic": topic,
        "event": event,
        "payload": {},
        "ref": reference.to_string()
    })
}

#[derive(Deserialize)]
struct PhoenixMessage {
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

#[derive(Debug, PartialEq)]
enum Frame {
    Change(ChangeEvent),
    Reply {
        reference: Option<String>,
        ok: bool,
        response: Value,
    },
    Closed(String),
    Ignored,
}

fn decode_frame(text: &str) -> Frame {
    let message: PhoenixMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("[REALTIME] unreadable frame: {}", e);
            return Frame::Ignored;
        }
    };

    match message.event.as_str() {
        "postgres_changes" => {
            let data = message.payload.get("data").unwrap_or(&message.payload);
            match ChangeEvent::from_postgres_change(data) {
                Ok(event) => Frame::Change(event),
                Err(e) => {
                    log::warn!("[REALTIME] skipping change: {}", e);
                    Frame::Ignored
                }
            }
        }
        "phx_reply" => Frame::Reply {
            reference: message.reference,
            ok: message.payload.get("status").and_then(Value::as_str) == Some("ok"),
            response: message.payload.get("response").cloned().unwrap_or(Value::Null),
        },
        "phx_error" | "phx_close" => Frame::Closed(message.event),
        _ => Frame::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WishPatch;

    #[test]
    fn test_join_message_shape() {
        let join = join_message("jwt");
        assert_eq!(join["topic"], "realtime:todos_changes");
        assert_eq!(join["event"], "phx_join");
        assert_eq!(join["payload"]["access_token"], "jwt");
        let filter = &join["payload"]["config"]["postgres_changes"][0];
        assert_eq!(filter["event"], "*");
        assert_eq!(filter["table"], "todos");
        assert!(filter.get("filter").is_none());
    }

    #[test]
    fn test_decode_postgres_change() {
        let text = r#"{"topic":"realtime:todos_changes","event":"postgres_changes","ref":null,
            "payload":{"ids":[1],"data":{"type":"UPDATE","schema":"public","table":"todos",
            "record":{"id":3,"text":"A","completed":true,"user_id":"u1"},"old_record":{"id":3}}}}"#;
        assert_eq!(
            decode_frame(text),
            Frame::Change(ChangeEvent::Update {
                id: 3,
                patch: WishPatch {
                    text: Some("A".to_string()),
                    completed: Some(true)
                }
            })
        );
    }

    #[test]
    fn test_decode_replies_and_control() {
        let ok = r#"{"topic":"realtime:todos_changes","event":"phx_reply","ref":"1",
            "payload":{"status":"ok","response":{"postgres_changes":[]}}}"#;
        assert!(matches!(
            decode_frame(ok),
            Frame::Reply { ok: true, reference: Some(ref r), .. } if r == "1"
        ));

        let refused = r#"{"topic":"realtime:todos_changes","event":"phx_reply","ref":"1",
            "payload":{"status":"error","response":{"reason":"unauthorized"}}}"#;
        assert!(matches!(decode_frame(refused), Frame::Reply { ok: false, .. }));

        let closed = r#"{"topic":"realtime:todos_changes","event":"phx_close","ref":null,"payload":{}}"#;
        assert_eq!(decode_frame(closed), Frame::Closed("phx_close".to_string()));

        let presence = r#"{"topic":"realtime:todos_changes","event":"presence_state","payload":{}}"#;
        assert_eq!(decode_frame(presence), Frame::Ignored);
        assert_eq!(decode_frame("not json"), Frame::Ignored);
    }

    #[test]
    fn test_access_token_message() {
        let update = access_token_message("fresh-jwt", 4);
        assert_eq!(update["topic"], "realtime:todos_changes");
        assert_eq!(update["event"], "access_token");
        assert_eq!(update["payload"]["access_token"], "fresh-jwt");
        assert_eq!(update["ref"], "4");
    }

    #[test]
    fn test_current_token_follows_session() {
        let (tx, rx) = tokio::sync::watch::channel(None);
        assert_eq!(current_token(&rx, "anon"), "anon");

        tx.send_replace(Some(crate::domain::Session {
            identity: crate::domain::Identity::new("u1", None),
            access_token: "jwt-2".to_string(),
            refresh_token: Some("r".to_string()),
            expires_in: Some(3600),
        }));
        assert_eq!(current_token(&rx, "anon"), "jwt-2");
    }

    #[test]
    fn test_heartbeat_message() {
        let beat = control_message(HEARTBEAT_TOPIC, "heartbeat", 7);
        assert_eq!(beat["topic"], "phoenix");
        assert_eq!(beat["ref"], "7");
    }
}
