//! Account and session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::{Permission, PermissionMap, Role};

pub type AccountId = u64;

/// Display format for last-login timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(format!("Unknown account status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    /// Argon2 PHC string; `None` for accounts that cannot log in yet
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub full_name: String,
    pub department: String,
    pub role: Role,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Last login as shown in the user table ("Never" when unset)
    pub fn last_login_display(&self) -> String {
        self.last_login
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "Never".to_string())
    }
}

/// Fields for an account that has not been assigned an id yet
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub department: String,
    pub role: Role,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
}

impl NewAccount {
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            department: self.department,
            role: self.role,
            status: self.status,
            last_login: self.last_login,
        }
    }
}

/// Sanitized projection of an account held in session storage.
///
/// The permission list is copied out of the role mapping when the session is
/// created and never refers back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: AccountId,
    pub email: String,
    pub full_name: String,
    pub department: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Session {
    pub fn project(account: &Account, permissions: &PermissionMap) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            department: account.department.clone(),
            role: account.role,
            permissions: permissions.permissions_for(account.role).to_vec(),
        }
    }

    /// Unknown tokens are never granted
    pub fn has_permission(&self, token: &str) -> bool {
        token
            .parse::<Permission>()
            .map(|perm| self.permissions.contains(&perm))
            .unwrap_or(false)
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
