//! Per-connection outbound event mailboxes.
//!
//! Each live connection gets a bounded `mpsc` mailbox; its session task
//! drains the receiver into the WebSocket. Delivery never blocks hub
//! operations: a full mailbox drops the event with a warning (the client
//! is too slow to keep up), and a missing or closed mailbox is a benign
//! teardown race, not an error.

use dashmap::DashMap;
use parlor_types::connection::ConnectionId;
use parlor_types::event::ServerEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default buffer size for per-connection outbound mailboxes.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Registry of per-connection outbound senders.
///
/// Target selection is explicit at every call site: `deliver` for a single
/// caller, `deliver_to` for room members, `deliver_all` for global
/// presence events. There is no ambient broadcast primitive.
#[derive(Debug)]
pub struct Mailboxes {
    senders: DashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
    capacity: usize,
}

impl Mailboxes {
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: DashMap::new(),
            capacity,
        }
    }

    /// Open a mailbox for a connection and return its receiver.
    ///
    /// If the connection somehow already had a mailbox, the old sender is
    /// replaced and its receiver ends.
    pub fn open(&self, conn: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.senders.insert(conn, tx);
        debug!(%conn, "opened outbound mailbox");
        rx
    }

    /// Drop a connection's mailbox. Returns true if one existed.
    pub fn close(&self, conn: ConnectionId) -> bool {
        let removed = self.senders.remove(&conn).is_some();
        if removed {
            debug!(%conn, "closed outbound mailbox");
        }
        removed
    }

    /// Deliver an event to a single connection.
    ///
    /// Skips silently if the mailbox is gone (the connection is tearing
    /// down); drops with a warning if the mailbox is full.
    pub fn deliver(&self, conn: ConnectionId, event: ServerEvent) {
        let Some(sender) = self.senders.get(&conn) else {
            debug!(%conn, "skipping delivery to removed connection");
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%conn, "outbound mailbox full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(%conn, "outbound mailbox closed, dropping event");
            }
        }
    }

    /// Deliver an event to an explicit set of connections (room members).
    pub fn deliver_to(&self, targets: &[ConnectionId], event: &ServerEvent) {
        for conn in targets {
            self.deliver(*conn, event.clone());
        }
    }

    /// Deliver an event to every open mailbox (global presence events).
    pub fn deliver_all(&self, event: &ServerEvent) {
        let targets: Vec<ConnectionId> = self.senders.iter().map(|entry| *entry.key()).collect();
        self.deliver_to(&targets, event);
    }
}

impl Default for Mailboxes {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> ServerEvent {
        ServerEvent::UserDisconnected {
            user_id: "u-1".to_string(),
        }
    }

    #[tokio::test]
    async fn deliver_reaches_open_mailbox() {
        let mailboxes = Mailboxes::default();
        let conn = ConnectionId::new();
        let mut rx = mailboxes.open(conn);

        mailboxes.deliver(conn, sample_event());
        assert_eq!(rx.recv().await.unwrap(), sample_event());
    }

    #[tokio::test]
    async fn deliver_to_missing_mailbox_is_a_no_op() {
        let mailboxes = Mailboxes::default();
        // Must not panic or error.
        mailboxes.deliver(ConnectionId::new(), sample_event());
    }

    #[tokio::test]
    async fn full_mailbox_drops_event() {
        let mailboxes = Mailboxes::new(1);
        let conn = ConnectionId::new();
        let mut rx = mailboxes.open(conn);

        mailboxes.deliver(conn, sample_event());
        mailboxes.deliver(conn, sample_event()); // dropped, buffer is 1

        assert_eq!(rx.recv().await.unwrap(), sample_event());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn deliver_all_reaches_every_connection() {
        let mailboxes = Mailboxes::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = mailboxes.open(a);
        let mut rx_b = mailboxes.open(b);

        mailboxes.deliver_all(&sample_event());

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn close_ends_the_receiver() {
        let mailboxes = Mailboxes::default();
        let conn = ConnectionId::new();
        let mut rx = mailboxes.open(conn);

        assert!(mailboxes.close(conn));
        assert!(!mailboxes.close(conn));
        assert!(rx.recv().await.is_none());
    }
}
