//! InkRelay WebSocket Server
//!
//! Keeps the shared drawing history, resolves eraser gestures into stroke
//! tombstones, and broadcasts every recorded action to all connected clients.
//! New clients receive the full history on join.
//!
//! ## Protocol
//!
//! ```json
//! { "event": "init", "data": [ ... ] }             // server -> client, once
//! { "event": "action", "data": { "type": ... } }   // both directions
//! { "event": "clear-history" }                     // client -> server
//! ```

pub mod config;
pub mod hub;
pub mod protocol;
pub mod server;
pub mod session;

pub use config::{ConfigError, ServerConfig};
pub use hub::{Hub, Subscription};
pub use protocol::{ClientEvent, ServerEvent};
pub use server::{router, run, serve};
