use shared::Config;
use std::sync::Arc;

use crate::services::{AccountService, GameApiClient};
use crate::storage::FileStore;

/// Shared application state.
/// Holds the configuration, the JSON store and the account service.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(FileStore::from_config(&config.storage));
        let game_client = GameApiClient::new(&config.game_api)
            .map_err(|e| anyhow::anyhow!("Failed to create game API client: {}", e))?;
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&store),
            game_client,
            config.game_api.cooldown_hours,
        ));

        Ok(Self {
            config,
            store,
            accounts,
        })
    }
}
