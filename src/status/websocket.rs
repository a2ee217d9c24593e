//! Status push channel: one bidirectional socket per client.
//!
//! On open the server sends the current status. Every scheduler event is
//! forwarded as a typed frame, and a `health` frame is sent on a fixed
//! interval regardless of scheduler activity. Clients may send
//! `{"type":"status"}` to request an out-of-band refresh. A slow client is
//! dropped rather than allowed to block the scheduler's broadcast.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use super::StatusService;
use crate::observability::Logger;

/// How often a connected client receives a `health` frame when no
/// scheduler event occurs in between, per spec.md §4.I.
const HEALTH_TICK_INTERVAL: Duration = Duration::from_secs(30);

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(status): State<Arc<StatusService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle(socket, status))
}

async fn handle(socket: WebSocket, status: Arc<StatusService>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = status.subscribe();
    let mut health_tick = tokio::time::interval(HEALTH_TICK_INTERVAL);
    health_tick.tick().await; // first tick fires immediately; the connect-time status frame covers it

    if let Some(frame) = status_frame(&status).await {
        if sender.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let frame = event.to_frame().to_string();
                        if sender.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        Logger::warn("push_channel_client_lagged", &[("skipped", &skipped.to_string())]);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = health_tick.tick() => {
                if sender.send(Message::Text(health_frame().into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if is_status_refresh_request(&text) {
                            if let Some(frame) = status_frame(&status).await {
                                if sender.send(Message::Text(frame.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

async fn status_frame(status: &StatusService) -> Option<String> {
    let response = status.build().await;
    serde_json::to_value(&response)
        .ok()
        .map(|data| json!({"type": "status", "data": data}).to_string())
}

fn health_frame() -> String {
    json!({"type": "health", "timestamp": Utc::now()}).to_string()
}

fn is_status_refresh_request(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
        .map(|t| t == "status")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_status_refresh_frame() {
        assert!(is_status_refresh_request(r#"{"type":"status"}"#));
        assert!(!is_status_refresh_request(r#"{"type":"ping"}"#));
        assert!(!is_status_refresh_request("not json"));
    }

    #[test]
    fn health_frame_carries_the_health_type_and_a_timestamp() {
        let frame = health_frame();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "health");
        assert!(value["timestamp"].is_string());
    }
}
