//! WebSocket handler for the chat hub.
//!
//! The `/ws/chat` endpoint authenticates the bearer token BEFORE upgrading
//! -- a connection that fails or times out at handshake is rejected with
//! 401 and never enters the protocol. After the upgrade the session task
//! owns the connection: it drains the hub mailbox into the socket and
//! feeds inbound frames to the hub, in arrival order, until either side
//! closes. Teardown always runs `disconnect`, which cancels any effect a
//! racing command could still have for this connection.
//!
//! Browsers cannot set headers on WebSocket requests, so the token is
//! accepted from an `access_token` query parameter as well as the
//! `Authorization: Bearer` header.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, warn};

use parlor_core::auth::TokenVerifier;
use parlor_types::error::AuthError;
use parlor_types::event::ClientCommand;
use parlor_types::user::UserProfile;

use crate::http::error::AppError;
use crate::state::AppState;

/// Query parameters accepted at the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Bearer token for clients that cannot set headers.
    pub access_token: Option<String>,
}

/// Upgrade an HTTP request to a WebSocket chat session.
///
/// This is mounted at `/ws/chat` in the router.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let token = extract_token(&headers, query.access_token.as_deref()).ok_or_else(|| {
        AppError::Unauthorized(
            "Missing bearer token. Provide via 'Authorization: Bearer <token>' header or 'access_token' query parameter.".to_string(),
        )
    })?;

    let timeout = Duration::from_secs(state.config.auth_timeout_secs);
    let profile = match tokio::time::timeout(timeout, state.verifier.verify(&token)).await {
        Ok(Ok(profile)) => profile,
        Ok(Err(AuthError::InvalidToken)) => {
            return Err(AppError::Unauthorized("Invalid or expired token.".to_string()));
        }
        Ok(Err(AuthError::Unavailable(reason))) => {
            warn!(%reason, "account service unavailable during handshake");
            return Err(AppError::Internal("Account service unavailable.".to_string()));
        }
        Err(_) => {
            warn!("token verification timed out at handshake");
            return Err(AppError::Unauthorized("Authentication timed out.".to_string()));
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_session(socket, state, profile)))
}

/// Core WebSocket session loop.
///
/// Uses `tokio::select!` to multiplex between the connection's hub
/// mailbox and inbound frames. Commands from this client are therefore
/// processed strictly in arrival order, while other connections run
/// concurrently.
async fn handle_session(socket: WebSocket, state: AppState, profile: UserProfile) {
    let user_id = profile.id.clone();
    let (conn, mut mailbox) = match state.hub.connect(profile) {
        Ok(accepted) => accepted,
        Err(err) => {
            error!(user = %user_id, %err, "hub rejected authenticated connection");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            // --- Branch 1: forward hub events to the client ---
            event = mailbox.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    // Client disconnected
                                    break;
                                }
                            }
                            Err(err) => {
                                warn!(%conn, "failed to serialize server event: {err}");
                            }
                        }
                    }
                    // Hub closed the mailbox (explicit disconnect elsewhere)
                    None => break,
                }
            }

            // --- Branch 2: process commands from the client ---
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(command) => state.hub.handle_command(conn, command).await,
                            Err(err) => {
                                warn!(
                                    %conn,
                                    raw = %text,
                                    error = %err,
                                    "ignoring malformed command frame"
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Client disconnected
                        break;
                    }
                    Some(Err(err)) => {
                        debug!(%conn, "websocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Disconnect is the cancellation signal: no further commands are
    // processed for this connection, and cleanup runs exactly once even
    // if the transport died mid-command.
    state.hub.disconnect(conn);
    debug!(%conn, user = %user_id, "websocket session ended");
}

/// Pull the bearer token from the `Authorization` header or the
/// `access_token` query parameter, in that order.
fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(auth) = headers.get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }
    query_token.map(|token| token.to_string())
}
