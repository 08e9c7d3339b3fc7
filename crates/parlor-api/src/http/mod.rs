//! HTTP/WebSocket surface of the hub.

pub mod error;
pub mod handlers;
pub mod router;
