//! WebSocket wire protocol: inbound commands and outbound events.
//!
//! Frames are JSON text, internally tagged with `"type"`. The variant names
//! (`JoinChat`, `ReceiveMessage`, ...) are the wire contract shared with
//! existing clients and must not change. Unknown or malformed inbound
//! frames are logged and ignored by the session handler, never fatal.

use serde::{Deserialize, Serialize};

use crate::message::MessageView;
use crate::user::UserProfile;

/// Room a command targets when it omits the `room` field.
pub const DEFAULT_ROOM: &str = "general";

/// Number of history messages pushed when a command omits `count`.
pub const DEFAULT_HISTORY_COUNT: u32 = 50;

fn default_room() -> String {
    DEFAULT_ROOM.to_string()
}

fn default_history_count() -> u32 {
    DEFAULT_HISTORY_COUNT
}

/// Inbound command from a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Join a room and receive its recent history.
    JoinChat {
        #[serde(default = "default_room")]
        room: String,
    },
    /// Leave a room.
    LeaveChat {
        #[serde(default = "default_room")]
        room: String,
    },
    /// Send a message to a joined room.
    SendMessage {
        content: String,
        #[serde(default = "default_room")]
        room: String,
    },
    /// Request the most recent messages of a room.
    GetChatHistory {
        #[serde(default = "default_room")]
        room: String,
        #[serde(default = "default_history_count")]
        count: u32,
    },
}

/// Outbound event pushed to clients.
///
/// Presence events (`UserConnected`, `UserDisconnected`, `OnlineUsers`) are
/// global; room events and messages go to room members only; `ChatHistory`
/// and `OnlineUsers` go to a single caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A user's first connection came online.
    UserConnected { user: UserProfile },
    /// A user's last connection went away.
    UserDisconnected { user_id: String },
    /// A connection joined a room.
    UserJoinedRoom { user: UserProfile, room: String },
    /// A connection left a room.
    UserLeftRoom { user: UserProfile, room: String },
    /// A freshly persisted message.
    ReceiveMessage { message: MessageView },
    /// Private history catch-up, ascending by timestamp.
    ChatHistory { messages: Vec<MessageView> },
    /// Presence snapshot for a freshly connected client.
    OnlineUsers { users: Vec<UserProfile> },
    /// A command failed for this caller only (e.g. the store was
    /// unavailable). The connection stays alive.
    OperationFailed { operation: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_chat_defaults_to_general() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"JoinChat"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::JoinChat {
                room: "general".to_string()
            }
        );
    }

    #[test]
    fn send_message_requires_content() {
        let err = serde_json::from_str::<ClientCommand>(r#"{"type":"SendMessage"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn get_chat_history_defaults() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"GetChatHistory","room":"dev"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::GetChatHistory {
                room: "dev".to_string(),
                count: 50
            }
        );
    }

    #[test]
    fn command_type_names_are_wire_contract() {
        let cmd = ClientCommand::LeaveChat {
            room: "general".to_string(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "LeaveChat");
    }

    #[test]
    fn event_type_names_are_wire_contract() {
        let user = UserProfile {
            id: "u-1".to_string(),
            display_name: "Ada".to_string(),
            avatar_url: String::new(),
        };

        let cases: Vec<(ServerEvent, &str)> = vec![
            (ServerEvent::UserConnected { user: user.clone() }, "UserConnected"),
            (
                ServerEvent::UserDisconnected {
                    user_id: "u-1".to_string(),
                },
                "UserDisconnected",
            ),
            (
                ServerEvent::UserJoinedRoom {
                    user: user.clone(),
                    room: "general".to_string(),
                },
                "UserJoinedRoom",
            ),
            (
                ServerEvent::UserLeftRoom {
                    user: user.clone(),
                    room: "general".to_string(),
                },
                "UserLeftRoom",
            ),
            (ServerEvent::ChatHistory { messages: vec![] }, "ChatHistory"),
            (ServerEvent::OnlineUsers { users: vec![user] }, "OnlineUsers"),
        ];

        for (event, expected) in cases {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], expected);
        }
    }

    #[test]
    fn user_disconnected_carries_camel_case_user_id() {
        let event = ServerEvent::UserDisconnected {
            user_id: "u-9".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"UserDisconnected","userId":"u-9"}"#);
    }
}
