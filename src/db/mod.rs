mod memory;
mod models;
mod seeders;

pub use memory::InMemoryAccountRepository;
pub use models::*;
pub use seeders::seed_accounts;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("account {0} not found")]
    NotFound(AccountId),
}

/// Narrow interface over the account catalog.
///
/// Email lookups are exact, case-sensitive matches. Implementations must
/// enforce email uniqueness inside `insert` and `update` themselves rather
/// than relying on callers checking first.
pub trait AccountRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<Account>;

    fn find_by_id(&self, id: AccountId) -> Option<Account>;

    /// All accounts ordered by id
    fn list(&self) -> Vec<Account>;

    /// Store a new account, assigning the next id
    fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError>;

    /// Replace the stored account with the same id
    fn update(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Set only the last-login timestamp of account `id`
    fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
