//! Database seeders for the demo catalog
//!
//! Seeds the two login-capable demo accounts plus the staff directory shown in
//! the user management table. Directory entries have no credential and cannot
//! log in until an administrator issues one.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use super::{AccountRepository, AccountStatus, NewAccount, RepositoryError, Role, TIMESTAMP_FORMAT};
use crate::crypto::CredentialHasher;

fn timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|ts| ts.and_utc())
}

/// Seed the demo accounts, skipping any whose email already exists.
/// Returns the number of accounts inserted.
pub fn seed_accounts(repo: &dyn AccountRepository, hasher: &CredentialHasher) -> Result<usize> {
    info!("Seeding demo accounts...");

    // Format: (email, password, full name, department, role, status, last login)
    let accounts: Vec<(&str, Option<&str>, &str, &str, Role, AccountStatus, &str)> = vec![
        (
            "admin@example.com",
            Some("Admin123"),
            "Admin User",
            "quality",
            Role::Admin,
            AccountStatus::Active,
            "2025-03-26 09:45",
        ),
        (
            "user@example.com",
            Some("User123"),
            "Regular User",
            "production",
            Role::User,
            AccountStatus::Active,
            "2025-03-25 14:30",
        ),
        (
            "john.doe@example.com",
            None,
            "John Doe",
            "quality",
            Role::Admin,
            AccountStatus::Active,
            "2025-03-26 09:45",
        ),
        (
            "jane.smith@example.com",
            None,
            "Jane Smith",
            "production",
            Role::Manager,
            AccountStatus::Active,
            "2025-03-25 14:30",
        ),
        (
            "robert.johnson@example.com",
            None,
            "Robert Johnson",
            "engineering",
            Role::User,
            AccountStatus::Active,
            "2025-03-26 11:20",
        ),
        (
            "lisa.wilson@example.com",
            None,
            "Lisa Wilson",
            "quality",
            Role::User,
            AccountStatus::Active,
            "2025-03-24 09:15",
        ),
        (
            "michael.brown@example.com",
            None,
            "Michael Brown",
            "engineering",
            Role::Manager,
            AccountStatus::Inactive,
            "2025-03-20 16:45",
        ),
    ];

    let mut inserted = 0;
    for (email, password, full_name, department, role, status, last_login) in accounts {
        let password_hash = match password {
            Some(p) => Some(
                hasher
                    .hash(p)
                    .with_context(|| format!("Failed to hash seed password for {}", email))?,
            ),
            None => None,
        };

        let account = NewAccount {
            email: email.to_string(),
            password_hash,
            full_name: full_name.to_string(),
            department: department.to_string(),
            role,
            status,
            last_login: timestamp(last_login),
        };

        match repo.insert(account) {
            Ok(_) => inserted += 1,
            Err(RepositoryError::DuplicateEmail(email)) => {
                warn!("Seed account {} already exists, skipping", email);
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeded {} demo accounts", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryAccountRepository;

    #[test]
    fn test_seed_accounts() {
        let repo = InMemoryAccountRepository::new();
        let hasher = CredentialHasher::fast_for_tests();

        let inserted = seed_accounts(&repo, &hasher).unwrap();
        assert_eq!(inserted, 7);

        let admin = repo.find_by_email("admin@example.com").unwrap();
        assert_eq!(admin.id, 1);
        assert_eq!(admin.role, Role::Admin);
        assert!(hasher.verify("Admin123", admin.password_hash.as_deref().unwrap()));
        assert_eq!(admin.last_login_display(), "2025-03-26 09:45");

        let michael = repo.find_by_email("michael.brown@example.com").unwrap();
        assert_eq!(michael.status, AccountStatus::Inactive);
        assert!(michael.password_hash.is_none());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let repo = InMemoryAccountRepository::new();
        let hasher = CredentialHasher::fast_for_tests();

        seed_accounts(&repo, &hasher).unwrap();
        let second = seed_accounts(&repo, &hasher).unwrap();
        assert_eq!(second, 0);
        assert_eq!(repo.len(), 7);
    }
}
