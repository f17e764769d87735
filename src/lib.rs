pub mod api;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod db;
pub mod storage;

use anyhow::{Context, Result};
use config::Config;
use std::sync::Arc;
use tracing::info;

use crate::api::{AuthService, UserDirectory};
use crate::db::{seed_accounts, AccountRepository, InMemoryAccountRepository};
use crate::storage::{FileScope, MemoryScope, SessionStorage};

pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountRepository>,
    pub auth: AuthService,
    pub users: UserDirectory,
}

impl AppState {
    /// Wire the catalog, session scopes and services from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let hasher = config.hasher()?;
        let permissions = config.permission_map()?;

        let repo = Arc::new(InMemoryAccountRepository::new());
        if config.auth.seed_demo_accounts {
            seed_accounts(repo.as_ref(), &hasher).context("Failed to seed demo accounts")?;
        }
        let accounts: Arc<dyn AccountRepository> = repo;

        let durable_path = config.storage.durable_path();
        info!("Durable session storage at {}", durable_path.display());
        let sessions = SessionStorage::new(
            Arc::new(FileScope::open(&durable_path)),
            Arc::new(MemoryScope::new()),
            config.storage.session_key.clone(),
        );

        let auth = AuthService::new(
            accounts.clone(),
            sessions,
            permissions,
            hasher,
            config.auth.min_password_length,
        );
        let users = UserDirectory::new(accounts.clone());

        Ok(Self {
            config,
            accounts,
            auth,
            users,
        })
    }
}
