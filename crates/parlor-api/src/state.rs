//! Application state wiring all services together.
//!
//! `AppState` holds the hub and its collaborators. The hub is generic over
//! its repository, but the state pins it to the concrete SQLite
//! implementation; the token verifier is the concrete `AccountVerifier`
//! enum for the same reason.

use std::sync::Arc;

use parlor_core::hub::ChatHub;
use parlor_infra::account::AccountVerifier;
use parlor_infra::config::load_config;
use parlor_infra::data_dir::resolve_data_dir;
use parlor_infra::sqlite::message::SqliteMessageRepository;
use parlor_infra::sqlite::pool::DatabasePool;
use parlor_types::config::HubConfig;

/// The hub pinned to its production repository.
pub type ConcreteHub = ChatHub<SqliteMessageRepository>;

/// Shared application state available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ConcreteHub>,
    pub verifier: Arc<AccountVerifier>,
    pub config: Arc<HubConfig>,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, wire the hub and the token verifier.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let database_url = config
            .database_url
            .clone()
            .unwrap_or_else(parlor_infra::sqlite::pool::default_database_url);
        let pool = DatabasePool::new(&database_url).await?;

        let hub = ChatHub::with_settings(
            SqliteMessageRepository::new(pool),
            config.history_limit,
            config.mailbox_capacity,
        );
        let verifier = AccountVerifier::from_config(&config.account);

        Ok(Self {
            hub: Arc::new(hub),
            verifier: Arc::new(verifier),
            config: Arc::new(config),
        })
    }
}
