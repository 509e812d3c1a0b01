//! Wire protocol.
//!
//! Every WebSocket text frame is a JSON envelope:
//! ```json
//! { "event": "init", "data": [ ...actions ] }
//! { "event": "action", "data": { "type": "stroke", ... } }
//! { "event": "clear-history" }
//! ```

use inkrelay_core::Action;
use serde::{Deserialize, Serialize};

/// Events sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Submit one action
    Action(Action),
    /// Wipe the shared history
    ClearHistory,
}

/// Events sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full history replay, sent once on join
    Init(Vec<Action>),
    /// One broadcast unit
    Action(Action),
}

impl ClientEvent {
    /// Parse a text frame. Malformed frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed client event");
                None
            }
        }
    }
}
