//! Static token verifier for development and tests.
//!
//! Resolves bearer tokens from a fixed table loaded out of `config.toml`.
//! Never use this in production -- tokens live in plaintext configuration.

use std::collections::HashMap;

use parlor_core::auth::TokenVerifier;
use parlor_types::config::StaticToken;
use parlor_types::error::AuthError;
use parlor_types::user::UserProfile;

/// Token table verifier.
pub struct StaticTokenVerifier {
    profiles: HashMap<String, UserProfile>,
}

impl StaticTokenVerifier {
    /// Build the table from configuration entries.
    pub fn from_config(tokens: &[StaticToken]) -> Self {
        let profiles = tokens
            .iter()
            .map(|entry| {
                (
                    entry.token.clone(),
                    UserProfile {
                        id: entry.user_id.clone(),
                        display_name: entry.display_name.clone(),
                        avatar_url: entry.avatar_url.clone(),
                    },
                )
            })
            .collect();
        Self { profiles }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserProfile, AuthError> {
        self.profiles
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StaticTokenVerifier {
        StaticTokenVerifier::from_config(&[StaticToken {
            token: "dev-token".to_string(),
            user_id: "u-dev".to_string(),
            display_name: "Dev User".to_string(),
            avatar_url: String::new(),
        }])
    }

    #[tokio::test]
    async fn known_token_resolves() {
        let profile = table().verify("dev-token").await.unwrap();
        assert_eq!(profile.id, "u-dev");
        assert_eq!(profile.display_name, "Dev User");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let err = table().verify("nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
