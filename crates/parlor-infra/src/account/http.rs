//! HTTP client for the account service.
//!
//! Verifies bearer tokens by calling `GET /api/v1/accounts/me` with the
//! token forwarded as-is; the account service answers with the user
//! projection it authenticates as. Parlor never sees or stores
//! credentials, only opaque tokens.

use std::time::Duration;

use parlor_core::auth::TokenVerifier;
use parlor_types::error::AuthError;
use parlor_types::user::UserProfile;

/// Account service client.
pub struct HttpAccountClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccountClient {
    /// Per-request timeout. The handshake additionally bounds the whole
    /// verification with its own timeout.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for the account service at `base_url`.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl TokenVerifier for HttpAccountClient {
    async fn verify(&self, token: &str) -> Result<UserProfile, AuthError> {
        let url = format!("{}/api/v1/accounts/me", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthError::InvalidToken);
        }
        if !response.status().is_success() {
            return Err(AuthError::Unavailable(format!(
                "account service returned {}",
                response.status()
            )));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| AuthError::Unavailable(format!("invalid account response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let client = HttpAccountClient::new("http://localhost:5000/".to_string());
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
