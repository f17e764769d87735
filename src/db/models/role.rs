//! Roles, permission tokens and the role-to-permission mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Account roles, from most to least privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user and settings management
    Admin,
    /// Read/write with limited delete
    Manager,
    /// Read with limited write
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    /// Role assigned to self-registered accounts
    pub fn lowest() -> Role {
        Role::User
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Capability flags used to gate UI features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    LimitedWrite,
    Delete,
    LimitedDelete,
    ManageUsers,
    ManageSettings,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::LimitedWrite => "limited_write",
            Permission::Delete => "delete",
            Permission::LimitedDelete => "limited_delete",
            Permission::ManageUsers => "manage_users",
            Permission::ManageSettings => "manage_settings",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "limited_write" => Ok(Permission::LimitedWrite),
            "delete" => Ok(Permission::Delete),
            "limited_delete" => Ok(Permission::LimitedDelete),
            "manage_users" => Ok(Permission::ManageUsers),
            "manage_settings" => Ok(Permission::ManageSettings),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PermissionMapError {
    #[error("role '{0}' has no permissions")]
    EmptyRole(Role),

    #[error("role '{0}' is missing from the permission map")]
    MissingRole(Role),
}

/// Closed mapping from every role to its permission tokens.
///
/// A map can only be built with a non-empty entry for each role and is never
/// mutated afterwards; changing permissions means building a new map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMap {
    entries: HashMap<Role, Vec<Permission>>,
}

impl PermissionMap {
    /// The standard QMS mapping
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            Role::Admin,
            vec![
                Permission::Read,
                Permission::Write,
                Permission::Delete,
                Permission::ManageUsers,
                Permission::ManageSettings,
            ],
        );
        entries.insert(
            Role::Manager,
            vec![Permission::Read, Permission::Write, Permission::LimitedDelete],
        );
        entries.insert(Role::User, vec![Permission::Read, Permission::LimitedWrite]);
        Self { entries }
    }

    /// Build a map from explicit entries, rejecting missing or empty roles
    pub fn from_entries(
        entries: HashMap<Role, Vec<Permission>>,
    ) -> Result<Self, PermissionMapError> {
        for role in Role::ALL {
            match entries.get(&role) {
                None => return Err(PermissionMapError::MissingRole(role)),
                Some(perms) if perms.is_empty() => {
                    return Err(PermissionMapError::EmptyRole(role))
                }
                Some(_) => {}
            }
        }
        Ok(Self { entries })
    }

    /// Standard map with the given roles replaced
    pub fn with_overrides(
        overrides: HashMap<Role, Vec<Permission>>,
    ) -> Result<Self, PermissionMapError> {
        let mut entries = Self::standard().entries;
        entries.extend(overrides);
        Self::from_entries(entries)
    }

    pub fn permissions_for(&self, role: Role) -> &[Permission] {
        self.entries.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for PermissionMap {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_map_covers_every_role() {
        let map = PermissionMap::standard();
        for role in Role::ALL {
            assert!(!map.permissions_for(role).is_empty(), "{} has no permissions", role);
        }
    }

    #[test]
    fn test_admin_permissions() {
        let map = PermissionMap::standard();
        assert_eq!(
            map.permissions_for(Role::Admin),
            &[
                Permission::Read,
                Permission::Write,
                Permission::Delete,
                Permission::ManageUsers,
                Permission::ManageSettings,
            ]
        );
    }

    #[test]
    fn test_from_entries_rejects_empty_role() {
        let mut entries = HashMap::new();
        entries.insert(Role::Admin, vec![Permission::Read]);
        entries.insert(Role::Manager, vec![]);
        entries.insert(Role::User, vec![Permission::Read]);

        assert_eq!(
            PermissionMap::from_entries(entries),
            Err(PermissionMapError::EmptyRole(Role::Manager))
        );
    }

    #[test]
    fn test_from_entries_rejects_missing_role() {
        let mut entries = HashMap::new();
        entries.insert(Role::Admin, vec![Permission::Read]);
        entries.insert(Role::Manager, vec![Permission::Read]);

        assert_eq!(
            PermissionMap::from_entries(entries),
            Err(PermissionMapError::MissingRole(Role::User))
        );
    }

    #[test]
    fn test_overrides_keep_other_roles() {
        let mut overrides = HashMap::new();
        overrides.insert(Role::User, vec![Permission::Read]);
        let map = PermissionMap::with_overrides(overrides).unwrap();

        assert_eq!(map.permissions_for(Role::User), &[Permission::Read]);
        assert_eq!(
            map.permissions_for(Role::Manager),
            PermissionMap::standard().permissions_for(Role::Manager)
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("manager".parse::<Role>(), Ok(Role::Manager));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_permission_tokens_roundtrip_through_display() {
        for token in ["read", "write", "limited_write", "delete", "limited_delete", "manage_users", "manage_settings"] {
            let perm: Permission = token.parse().unwrap();
            assert_eq!(perm.to_string(), token);
        }
        assert!("Read".parse::<Permission>().is_err());
    }
}
