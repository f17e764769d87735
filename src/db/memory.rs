//! In-memory account catalog.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use super::{Account, AccountId, AccountRepository, NewAccount, RepositoryError};

/// Account catalog kept in a `Vec` behind a lock; ids are assigned
/// sequentially starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<Vec<Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

impl AccountRepository for InMemoryAccountRepository {
    fn find_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .read()
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }

    fn find_by_id(&self, id: AccountId) -> Option<Account> {
        self.accounts.read().iter().find(|a| a.id == id).cloned()
    }

    fn list(&self) -> Vec<Account> {
        let mut accounts = self.accounts.read().clone();
        accounts.sort_by_key(|a| a.id);
        accounts
    }

    fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        // Check and append under one write guard so duplicates cannot slip in
        let mut accounts = self.accounts.write();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(RepositoryError::DuplicateEmail(account.email));
        }

        let id = accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let account = account.into_account(id);
        accounts.push(account.clone());
        debug!(id, email = %account.email, "Inserted account");
        Ok(account)
    }

    fn update(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write();
        if accounts
            .iter()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(RepositoryError::DuplicateEmail(account.email.clone()));
        }

        let slot = accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or(RepositoryError::NotFound(account.id))?;
        *slot = account.clone();
        Ok(())
    }

    fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound(id))?;
        account.last_login = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AccountStatus, Role};
    use std::sync::Arc;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: None,
            full_name: "Test User".to_string(),
            department: "qa".to_string(),
            role: Role::User,
            status: AccountStatus::Active,
            last_login: None,
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.insert(new_account("a@example.com")).unwrap();
        let b = repo.insert(new_account("b@example.com")).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_insert_rejects_duplicate_email() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(new_account("a@example.com")).unwrap();

        let err = repo.insert(new_account("a@example.com")).unwrap_err();
        assert_eq!(err, RepositoryError::DuplicateEmail("a@example.com".to_string()));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_email_lookup_is_case_sensitive() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(new_account("a@example.com")).unwrap();

        assert!(repo.find_by_email("a@example.com").is_some());
        assert!(repo.find_by_email("A@example.com").is_none());
    }

    #[test]
    fn test_update_replaces_account() {
        let repo = InMemoryAccountRepository::new();
        let mut account = repo.insert(new_account("a@example.com")).unwrap();
        account.status = AccountStatus::Inactive;

        repo.update(&account).unwrap();
        assert_eq!(repo.find_by_id(account.id).unwrap().status, AccountStatus::Inactive);
    }

    #[test]
    fn test_update_rejects_email_collision() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(new_account("a@example.com")).unwrap();
        let mut b = repo.insert(new_account("b@example.com")).unwrap();
        b.email = "a@example.com".to_string();

        assert!(matches!(repo.update(&b), Err(RepositoryError::DuplicateEmail(_))));
    }

    #[test]
    fn test_update_missing_account() {
        let repo = InMemoryAccountRepository::new();
        let ghost = new_account("ghost@example.com").into_account(42);
        assert_eq!(repo.update(&ghost), Err(RepositoryError::NotFound(42)));
    }

    #[test]
    fn test_record_login_touches_only_timestamp() {
        let repo = InMemoryAccountRepository::new();
        let mut account = repo.insert(new_account("a@example.com")).unwrap();
        account.role = Role::Manager;
        repo.update(&account).unwrap();

        let at = Utc::now();
        repo.record_login(account.id, at).unwrap();

        let stored = repo.find_by_id(account.id).unwrap();
        assert_eq!(stored.last_login, Some(at));
        assert_eq!(stored.role, Role::Manager);
        assert_eq!(repo.record_login(42, at), Err(RepositoryError::NotFound(42)));
    }

    #[test]
    fn test_concurrent_inserts_keep_email_unique() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                std::thread::spawn(move || repo.insert(new_account("race@example.com")).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(repo.len(), 1);
    }
}
