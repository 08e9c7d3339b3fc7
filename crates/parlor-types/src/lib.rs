//! Shared domain types for Parlor.
//!
//! This crate contains the types used across the Parlor chat hub:
//! connection identifiers, user projections, chat messages, the WebSocket
//! wire protocol, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod message;
pub mod user;
