//! Per-connection protocol handling.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::hub::Hub;
use crate::protocol::{ClientEvent, ServerEvent};

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Disconnected,
}

/// Drive a WebSocket connection until the client goes away.
pub async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sender, mut receiver) = socket.split();
    let mut state = SessionState::Connecting;

    let sub = hub.connect();
    let conn_id = sub.conn_id;
    let mut events = sub.events;
    info!(conn_id = %conn_id, history = sub.snapshot.len(), "Client connected");

    if send_event(&mut sender, &ServerEvent::Init(sub.snapshot)).await {
        state = SessionState::Active;
    }

    while state == SessionState::Active {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ClientEvent::parse(&text) {
                        Some(ClientEvent::Action(action)) => {
                            hub.submit(action);
                        }
                        Some(ClientEvent::ClearHistory) => {
                            info!(conn_id = %conn_id, "History cleared");
                            hub.clear_history();
                        }
                        None => {}
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        state = SessionState::Disconnected;
                    }
                    Some(Ok(_)) => {} // Ignore binary/ping/pong
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        state = SessionState::Disconnected;
                    }
                }
            }

            event = events.recv() => {
                match event {
                    Some(event) => {
                        if !send_event(&mut sender, &event).await {
                            state = SessionState::Disconnected;
                        }
                    }
                    None => {
                        state = SessionState::Disconnected;
                    }
                }
            }
        }
    }

    hub.disconnect(&conn_id);
    info!(conn_id = %conn_id, ?state, "Client disconnected");
}

/// Serialize and send one event. Returns `false` if the connection is gone.
async fn send_event<S>(sender: &mut S, event: &ServerEvent) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize event");
            return true;
        }
    };
    if sender.send(Message::Text(json.into())).await.is_err() {
        debug!("Send failed, dropping connection");
        return false;
    }
    true
}
