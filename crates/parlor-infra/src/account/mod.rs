//! Account service adapters.
//!
//! The account service owns registration, login, and credential storage;
//! Parlor only verifies bearer tokens against it at handshake. Two
//! implementations of the `TokenVerifier` port live here: the HTTP client
//! used in production and a static token table for development and tests.

pub mod http;
pub mod static_table;

use parlor_core::auth::TokenVerifier;
use parlor_types::config::AccountConfig;
use parlor_types::error::AuthError;
use parlor_types::user::UserProfile;

use http::HttpAccountClient;
use static_table::StaticTokenVerifier;

/// Concrete verifier the application state pins to.
///
/// An enum rather than a trait object so axum state stays non-generic
/// while the `TokenVerifier` trait keeps its RPITIT shape.
pub enum AccountVerifier {
    /// Forward tokens to a remote account service.
    Http(HttpAccountClient),
    /// Resolve tokens from a static table (development/tests only).
    Static(StaticTokenVerifier),
}

impl AccountVerifier {
    /// Build a verifier from configuration: HTTP when a base URL is set,
    /// otherwise the static token table.
    pub fn from_config(config: &AccountConfig) -> Self {
        match &config.base_url {
            Some(base_url) => {
                tracing::info!(%base_url, "verifying tokens against account service");
                AccountVerifier::Http(HttpAccountClient::new(base_url.clone()))
            }
            None => {
                if config.static_tokens.is_empty() {
                    tracing::warn!(
                        "no account service configured and the static token table is empty; \
                         every connection will be rejected"
                    );
                } else {
                    tracing::info!(
                        tokens = config.static_tokens.len(),
                        "verifying tokens against the static table"
                    );
                }
                AccountVerifier::Static(StaticTokenVerifier::from_config(&config.static_tokens))
            }
        }
    }
}

impl TokenVerifier for AccountVerifier {
    async fn verify(&self, token: &str) -> Result<UserProfile, AuthError> {
        match self {
            AccountVerifier::Http(client) => client.verify(token).await,
            AccountVerifier::Static(table) => table.verify(token).await,
        }
    }
}
