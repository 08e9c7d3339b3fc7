//! Hub logic and port definitions for Parlor.
//!
//! This crate owns the chat hub's in-memory state machines (connection
//! registry, room membership, presence derivation, per-connection
//! mailboxes) and the "ports" the infrastructure layer implements
//! (`MessageRepository`, `TokenVerifier`). It depends only on
//! `parlor-types` -- never on `parlor-infra` or any database/IO crate.

pub mod auth;
pub mod hub;
pub mod presence;
pub mod registry;
pub mod repository;
pub mod rooms;
pub mod sanitize;
pub mod session;
