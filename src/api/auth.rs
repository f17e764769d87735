use arc_swap::ArcSwap;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{ApiError, AuthError, RegistrationError};
use crate::crypto::CredentialHasher;
use crate::db::{
    Account, AccountRepository, AccountStatus, NewAccount, PermissionMap, RepositoryError, Role,
    Session,
};
use crate::storage::{Durability, SessionStorage};

/// Registration form as submitted
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Form with the confirmation already matching the password
    pub fn new(full_name: &str, email: &str, department: &str, password: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            email: email.to_string(),
            department: department.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }
}

/// Confirmation that a reset link "was sent"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetNotice {
    pub email: String,
}

impl std::fmt::Display for ResetNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password reset link has been sent to {}", self.email)
    }
}

/// True iff a session is present and grants `token`
pub fn has_permission(session: Option<&Session>, token: &str) -> bool {
    session.map(|s| s.has_permission(token)).unwrap_or(false)
}

/// Authentication, session and registration service.
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    sessions: SessionStorage,
    permissions: ArcSwap<PermissionMap>,
    hasher: CredentialHasher,
    min_password_length: usize,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: SessionStorage,
        permissions: PermissionMap,
        hasher: CredentialHasher,
        min_password_length: usize,
    ) -> Self {
        Self {
            accounts,
            sessions,
            permissions: ArcSwap::from_pointee(permissions),
            hasher,
            min_password_length,
        }
    }

    /// Swap the role mapping. Existing sessions keep the permissions they were
    /// created with.
    pub fn replace_permissions(&self, permissions: PermissionMap) {
        self.permissions.store(Arc::new(permissions));
        info!("Role permission mapping replaced");
    }

    /// Find the active account matching `email` whose credential verifies.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .find_by_email(email)
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = account.is_active()
            && account
                .password_hash
                .as_deref()
                .map(|hash| self.hasher.verify(password, hash))
                .unwrap_or(false);

        if !verified {
            debug!(account_id = account.id, "Credential check failed");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(account)
    }

    /// Stamp the last login, then project `account` into a session and store it.
    ///
    /// Nothing is stored when the account is no longer in the catalog.
    pub fn create_session(&self, account: &Account, persistent: bool) -> Result<Session, AuthError> {
        self.accounts.record_login(account.id, Utc::now())?;

        let session = Session::project(account, &self.permissions.load());
        self.sessions
            .save(&session, Durability::from_remember(persistent))?;

        info!(account_id = account.id, persistent, "Session created");
        Ok(session)
    }

    pub fn current_session(&self) -> Option<Session> {
        self.sessions.load()
    }

    pub fn destroy_session(&self) {
        self.sessions.clear();
    }

    /// Login form flow: validate, authenticate, store the session.
    pub fn login(&self, email: &str, password: &str, remember: bool) -> Result<Session, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let account = match self.authenticate(email, password) {
            Ok(account) => account,
            Err(e) => {
                warn!("Rejected login attempt");
                return Err(e);
            }
        };
        self.create_session(&account, remember)
    }

    pub fn logout(&self) {
        if let Some(session) = self.current_session() {
            info!(account_id = session.id, "Logged out");
        }
        self.destroy_session();
    }

    /// Create a self-registered account with the lowest-privilege role.
    pub fn register(&self, form: &RegistrationForm) -> Result<Account, RegistrationError> {
        if form.full_name.is_empty()
            || form.email.is_empty()
            || form.department.is_empty()
            || form.password.is_empty()
        {
            return Err(RegistrationError::MissingFields);
        }

        if form.password != form.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }

        // Counted in Unicode scalar values
        if form.password.chars().count() < self.min_password_length {
            return Err(RegistrationError::PasswordTooShort {
                min: self.min_password_length,
            });
        }

        if self.accounts.find_by_email(&form.email).is_some() {
            return Err(RegistrationError::DuplicateEmail);
        }

        let account = NewAccount {
            email: form.email.clone(),
            password_hash: Some(self.hasher.hash(&form.password)?),
            full_name: form.full_name.clone(),
            department: form.department.clone(),
            role: Role::lowest(),
            status: AccountStatus::Active,
            last_login: Some(Utc::now()),
        };

        let account = self.accounts.insert(account).map_err(|e| match e {
            RepositoryError::DuplicateEmail(_) => RegistrationError::DuplicateEmail,
            other => RegistrationError::Repository(other),
        })?;

        info!(account_id = account.id, email = %account.email, "Registered account");
        Ok(account)
    }

    /// Forgot-password flow. No mail is sent; the notice names the address.
    pub fn request_password_reset(&self, email: &str) -> Result<ResetNotice, ApiError> {
        if email.is_empty() {
            return Err(ApiError::validation_field("email", "Email is required"));
        }

        let account = self
            .accounts
            .find_by_email(email)
            .ok_or_else(|| ApiError::not_found("No account found with this email"))?;

        info!(account_id = account.id, "Password reset requested");
        Ok(ResetNotice {
            email: account.email,
        })
    }
}
