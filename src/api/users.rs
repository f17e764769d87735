//! Administrator user directory: listing, filtering and editing accounts.
//!
//! Every operation takes the caller's session and requires `manage_users`.

use std::sync::Arc;
use tracing::info;

use super::auth::ResetNotice;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_required};
use crate::db::{
    Account, AccountId, AccountRepository, AccountStatus, NewAccount, Permission, Role, Session,
};

/// Table filter; `None` criteria match everything
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    /// Case-insensitive department match
    pub department: Option<String>,
    pub status: Option<AccountStatus>,
}

impl UserFilter {
    pub fn matches(&self, account: &Account) -> bool {
        let matches_search = match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                account.full_name.to_lowercase().contains(&term)
                    || account.email.to_lowercase().contains(&term)
            }
            None => true,
        };
        let matches_department = self
            .department
            .as_ref()
            .map_or(true, |d| account.department.eq_ignore_ascii_case(d));

        matches_search
            && self.role.map_or(true, |r| account.role == r)
            && matches_department
            && self.status.map_or(true, |s| account.status == s)
    }
}

/// Add/edit form from the user modal
#[derive(Debug, Clone)]
pub struct UserForm {
    /// Present when editing an existing account
    pub id: Option<AccountId>,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub status: AccountStatus,
}

pub struct UserDirectory {
    accounts: Arc<dyn AccountRepository>,
}

fn require_admin(session: &Session) -> Result<(), ApiError> {
    if session.grants(Permission::ManageUsers) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to manage users"))
    }
}

impl UserDirectory {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub fn list(&self, session: &Session, filter: &UserFilter) -> Result<Vec<Account>, ApiError> {
        require_admin(session)?;
        Ok(self
            .accounts
            .list()
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect())
    }

    pub fn get(&self, session: &Session, id: AccountId) -> Result<Account, ApiError> {
        require_admin(session)?;
        self.accounts
            .find_by_id(id)
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Add a new account or update the one named by `form.id`.
    pub fn save(&self, session: &Session, form: &UserForm) -> Result<Account, ApiError> {
        require_admin(session)?;

        let mut errors = ValidationErrorBuilder::new();
        errors.check("name", validate_required("Name", &form.name));
        errors.check("email", validate_email(&form.email));
        errors.check("department", validate_required("Department", &form.department));
        errors.finish()?;

        match form.id {
            Some(id) => {
                let mut account = self
                    .accounts
                    .find_by_id(id)
                    .ok_or_else(|| ApiError::not_found("User not found"))?;
                account.full_name = form.name.clone();
                account.email = form.email.clone();
                account.department = form.department.clone();
                account.role = form.role;
                account.status = form.status;
                self.accounts.update(&account)?;

                info!(admin_id = session.id, account_id = id, "User updated");
                Ok(account)
            }
            None => {
                let account = self.accounts.insert(NewAccount {
                    email: form.email.clone(),
                    password_hash: None,
                    full_name: form.name.clone(),
                    department: form.department.clone(),
                    role: form.role,
                    status: form.status,
                    last_login: None,
                })?;

                info!(admin_id = session.id, account_id = account.id, "User added");
                Ok(account)
            }
        }
    }

    /// Deactivate instead of deleting; the account stays in the catalog.
    pub fn deactivate(&self, session: &Session, id: AccountId) -> Result<Account, ApiError> {
        let mut account = self.get(session, id)?;
        account.status = AccountStatus::Inactive;
        self.accounts.update(&account)?;

        info!(admin_id = session.id, account_id = id, "User deactivated");
        Ok(account)
    }

    pub fn send_password_reset(
        &self,
        session: &Session,
        id: AccountId,
    ) -> Result<ResetNotice, ApiError> {
        let account = self.get(session, id)?;
        info!(admin_id = session.id, account_id = id, "Password reset issued");
        Ok(ResetNotice {
            email: account.email,
        })
    }
}
