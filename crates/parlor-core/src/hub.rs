//! The chat hub session protocol.
//!
//! `ChatHub` ties the connection registry, room tracker, presence
//! derivation, and message repository together, and drives the
//! per-connection lifecycle: connect -> join -> send/receive -> leave ->
//! disconnect.
//!
//! Commands from one connection are processed in arrival order by its
//! session task; commands from different connections interleave freely.
//! The registry and tracker guard themselves, and the persist-then-
//! broadcast section is serialized so that a message appended before
//! another is never observed after it by any room member.
//!
//! A closed connection is terminal: late-arriving commands find no
//! registry entry and become no-ops, because transport teardown legally
//! races in-flight commands.

use parlor_types::connection::ConnectionId;
use parlor_types::error::HubError;
use parlor_types::event::{ClientCommand, ServerEvent, DEFAULT_HISTORY_COUNT};
use parlor_types::user::UserProfile;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::registry::ConnectionRegistry;
use crate::repository::MessageRepository;
use crate::rooms::RoomTracker;
use crate::sanitize::escape_html;
use crate::session::{Mailboxes, DEFAULT_MAILBOX_CAPACITY};

/// The stateful hub shared by all connections.
///
/// Generic over the message repository so tests can swap in an in-memory
/// fake; the binary pins it to the SQLite implementation.
pub struct ChatHub<R> {
    registry: ConnectionRegistry,
    rooms: RoomTracker,
    mailboxes: Mailboxes,
    repository: R,
    history_limit: u32,
    /// Serializes append + fan-out so room delivery order always matches
    /// persisted order. Mutations of the in-memory maps never wait on
    /// this; only the send path does.
    send_serial: Mutex<()>,
}

impl<R: MessageRepository> ChatHub<R> {
    pub fn new(repository: R) -> Self {
        Self::with_settings(repository, DEFAULT_HISTORY_COUNT, DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a hub with explicit history and mailbox settings (from
    /// `HubConfig`).
    pub fn with_settings(repository: R, history_limit: u32, mailbox_capacity: usize) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomTracker::new(),
            mailboxes: Mailboxes::new(mailbox_capacity),
            repository,
            history_limit,
            send_serial: Mutex::new(()),
        }
    }

    /// Accept an authenticated connection into the hub.
    ///
    /// Mints a fresh connection id, opens its outbound mailbox, and
    /// registers it. If this is the user's first live connection, a
    /// `UserConnected` event goes to all clients; the presence snapshot
    /// goes to the caller only.
    ///
    /// Returns the connection id and the mailbox receiver the session
    /// task must drain into the transport.
    pub fn connect(
        &self,
        profile: UserProfile,
    ) -> Result<(ConnectionId, mpsc::Receiver<ServerEvent>), HubError> {
        let conn = ConnectionId::new();
        let rx = self.mailboxes.open(conn);

        let transition = match self.registry.register(conn, profile.clone()) {
            Ok(transition) => transition,
            Err(err) => {
                // Freshly minted ids cannot collide; this is an internal
                // invariant violation. Force-close and surface it.
                error!(%conn, %err, "registration failed for fresh connection");
                self.mailboxes.close(conn);
                return Err(err.into());
            }
        };

        info!(%conn, user = %profile.id, "connection joined the hub");

        if transition.became_online() {
            self.mailboxes.deliver_all(&ServerEvent::UserConnected {
                user: profile.clone(),
            });
        }
        self.mailboxes.deliver(
            conn,
            ServerEvent::OnlineUsers {
                users: self.registry.online_users(),
            },
        );

        Ok((conn, rx))
    }

    /// Tear down a connection: leave every room, unregister, close the
    /// mailbox, and announce the departure if the user went fully offline.
    ///
    /// Safe to call for an already-closed connection (teardown races are
    /// expected); the second call is a no-op.
    pub fn disconnect(&self, conn: ConnectionId) {
        self.mailboxes.close(conn);
        let rooms = self.rooms.remove_connection_everywhere(conn);

        match self.registry.unregister(conn) {
            Ok((profile, transition)) => {
                info!(%conn, user = %profile.id, rooms = rooms.len(), "connection left the hub");
                if transition.became_offline() {
                    self.mailboxes
                        .deliver_all(&ServerEvent::UserDisconnected { user_id: profile.id });
                }
            }
            Err(_) => {
                // Normal when an explicit disconnect raced transport
                // teardown; the connection is already gone.
                debug!(%conn, "disconnect for unknown connection");
            }
        }
    }

    /// Dispatch one inbound command for a connection.
    pub async fn handle_command(&self, conn: ConnectionId, command: ClientCommand) {
        match command {
            ClientCommand::JoinChat { room } => self.join_room(conn, &room).await,
            ClientCommand::LeaveChat { room } => self.leave_room(conn, &room).await,
            ClientCommand::SendMessage { content, room } => {
                self.send_message(conn, &room, &content).await
            }
            ClientCommand::GetChatHistory { room, count } => {
                self.chat_history(conn, &room, count).await
            }
        }
    }

    /// Join a room, announce the arrival to its members, and push recent
    /// history to the joining connection only.
    ///
    /// History is a private catch-up; broadcasting it to the room would
    /// replay it for everyone. Re-joining is allowed and always answers
    /// with a fresh full push -- a reconnect never inherits room state.
    pub async fn join_room(&self, conn: ConnectionId, room: &str) {
        let Some(profile) = self.registry.profile(conn) else {
            debug!(%conn, room, "ignoring join from closed connection");
            return;
        };

        self.rooms.join(room, conn);
        debug!(%conn, user = %profile.id, room, "joined room");

        let members = self.rooms.members_of(room);
        self.mailboxes.deliver_to(
            &members,
            &ServerEvent::UserJoinedRoom {
                user: profile,
                room: room.to_string(),
            },
        );

        self.push_history(conn, room, self.history_limit, "JoinChat")
            .await;
    }

    /// Leave a room and announce the departure to the remaining members.
    ///
    /// Leaving a room the connection never joined is a silent no-op.
    pub async fn leave_room(&self, conn: ConnectionId, room: &str) {
        let Some(profile) = self.registry.profile(conn) else {
            debug!(%conn, room, "ignoring leave from closed connection");
            return;
        };

        if !self.rooms.leave(room, conn) {
            debug!(%conn, room, "leave for a room the connection is not in");
            return;
        }

        let remaining = self.rooms.members_of(room);
        self.mailboxes.deliver_to(
            &remaining,
            &ServerEvent::UserLeftRoom {
                user: profile,
                room: room.to_string(),
            },
        );
    }

    /// Persist a message, then broadcast it to the room's current members.
    ///
    /// Membership is required; a non-member send is rejected silently (no
    /// broadcast, nothing stored). Content is HTML-escaped before it is
    /// persisted, so history and the live stream carry identical text.
    /// Persist-before-broadcast is mandatory: a message the store refused
    /// is reported to the sender only and reaches nobody else.
    pub async fn send_message(&self, conn: ConnectionId, room: &str, content: &str) {
        let Some(profile) = self.registry.profile(conn) else {
            debug!(%conn, room, "ignoring message from closed connection");
            return;
        };

        if !self.rooms.is_member(room, conn) {
            debug!(%conn, user = %profile.id, room, "rejecting message from non-member");
            return;
        }

        let sanitized = escape_html(content);

        let _ordering = self.send_serial.lock().await;
        let stored = match self.repository.append(room, &profile, &sanitized).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(%conn, room, %err, "failed to persist message");
                self.mailboxes.deliver(
                    conn,
                    ServerEvent::OperationFailed {
                        operation: "SendMessage".to_string(),
                        reason: err.to_string(),
                    },
                );
                return;
            }
        };

        // Membership as of the moment the append completed.
        let members = self.rooms.members_of(room);
        self.mailboxes.deliver_to(
            &members,
            &ServerEvent::ReceiveMessage {
                message: stored.into(),
            },
        );
    }

    /// Push the most recent messages of a room to the caller only.
    pub async fn chat_history(&self, conn: ConnectionId, room: &str, count: u32) {
        if self.registry.profile(conn).is_none() {
            debug!(%conn, room, "ignoring history request from closed connection");
            return;
        }
        self.push_history(conn, room, count, "GetChatHistory").await;
    }

    async fn push_history(&self, conn: ConnectionId, room: &str, count: u32, operation: &str) {
        match self.repository.recent(room, count).await {
            Ok(messages) => {
                self.mailboxes.deliver(
                    conn,
                    ServerEvent::ChatHistory {
                        messages: messages.into_iter().map(Into::into).collect(),
                    },
                );
            }
            Err(err) => {
                warn!(%conn, room, %err, "failed to load history");
                self.mailboxes.deliver(
                    conn,
                    ServerEvent::OperationFailed {
                        operation: operation.to_string(),
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    /// Number of live connections (health reporting).
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Number of rooms with at least one member (health reporting).
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }
}
