//! Configuration types for the Parlor hub.
//!
//! `HubConfig` represents the top-level `config.toml` that controls the
//! listen address, persistence location, history defaults, and the account
//! service used for handshake authentication.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Parlor hub.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Socket address the HTTP/WebSocket server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite database URL. Defaults to `{data_dir}/parlor.db` when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Number of messages pushed on room join and the `GetChatHistory`
    /// default.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Upper bound on token verification at handshake, in seconds. A
    /// connection that cannot authenticate within this window is dropped.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,

    /// Buffer size of each connection's outbound event mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Account service settings.
    #[serde(default)]
    pub account: AccountConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_history_limit() -> u32 {
    50
}

fn default_auth_timeout_secs() -> u64 {
    5
}

fn default_mailbox_capacity() -> usize {
    256
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_url: None,
            history_limit: default_history_limit(),
            auth_timeout_secs: default_auth_timeout_secs(),
            mailbox_capacity: default_mailbox_capacity(),
            account: AccountConfig::default(),
        }
    }
}

/// How bearer tokens are verified at handshake.
///
/// When `base_url` is set, tokens are forwarded to the account service.
/// Otherwise the static token table is used (development and tests only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Base URL of the account service (e.g. `http://localhost:5000`).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Static token table used when no account service is configured.
    #[serde(default)]
    pub static_tokens: Vec<StaticToken>,
}

/// One entry of the static token table: a bearer token and the identity it
/// authenticates as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = HubConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.auth_timeout_secs, 5);
        assert!(config.database_url.is_none());
        assert!(config.account.base_url.is_none());
        assert!(config.account.static_tokens.is_empty());
    }

    #[test]
    fn parses_partial_toml() {
        let config: HubConfig = toml::from_str(
            r#"
bind_addr = "0.0.0.0:9000"

[account]
base_url = "http://localhost:5000"
"#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.history_limit, 50);
        assert_eq!(
            config.account.base_url.as_deref(),
            Some("http://localhost:5000")
        );
    }

    #[test]
    fn parses_static_token_table() {
        let config: HubConfig = toml::from_str(
            r#"
[[account.static_tokens]]
token = "dev-token"
user_id = "u-dev"
display_name = "Dev User"
"#,
        )
        .unwrap();
        assert_eq!(config.account.static_tokens.len(), 1);
        assert_eq!(config.account.static_tokens[0].user_id, "u-dev");
        assert_eq!(config.account.static_tokens[0].avatar_url, "");
    }
}
