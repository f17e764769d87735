//! Unified error handling for the QMS service layer.
//!
//! Domain operations return precise `thiserror` enums (`AuthError`,
//! `RegistrationError`). Screens that only need something to show the user
//! convert them into an [`ApiError`]: a machine-readable code, a human-readable
//! message and optional field-level details.

use std::collections::HashMap;
use thiserror::Error;

use crate::crypto::HashError;
use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Error codes for service responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Caller errors, recoverable by re-prompting
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ValidationError,

    // Local failures
    InternalError,
    StorageError,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::StorageError => "storage_error",
        }
    }
}

/// Additional error details
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    /// Field-level validation errors
    ValidationErrors(HashMap<String, Vec<String>>),
}

/// Unified service error type
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<ErrorDetails>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        self.details.as_ref()
    }

    /// Add validation errors as details
    pub fn with_validation_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.details = Some(ErrorDetails::ValidationErrors(errors));
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Authentication required or rejected
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Authenticated but not allowed
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Resource already exists
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Validation error with field-level details
    pub fn validation(errors: HashMap<String, Vec<String>>) -> Self {
        let message = if errors.len() == 1 {
            errors
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", errors.len())
        };

        Self::new(ErrorCode::ValidationError, message).with_validation_errors(errors)
    }

    /// Single field validation error
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::validation(errors)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// Login and session failures.
///
/// `InvalidCredentials` covers unknown email, wrong password,
/// missing credential and inactive account alike.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Failed to store session: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to record login: {0}")]
    Repository(#[from] RepositoryError),
}

/// Registration failures, in the order they are checked
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::MissingCredentials => ApiError::bad_request(err.to_string()),
            AuthError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AuthError::Storage(_) => {
                tracing::error!("Session storage error: {}", err);
                ApiError::storage("Could not save your session")
            }
            AuthError::Repository(_) => {
                tracing::error!("Account catalog error: {}", err);
                ApiError::internal("Could not complete login")
            }
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match &err {
            RegistrationError::MissingFields => ApiError::bad_request(err.to_string()),
            RegistrationError::PasswordMismatch => {
                ApiError::validation_field("confirm_password", err.to_string())
            }
            RegistrationError::PasswordTooShort { .. } => {
                ApiError::validation_field("password", err.to_string())
            }
            RegistrationError::DuplicateEmail => ApiError::conflict(err.to_string()),
            RegistrationError::Hashing(_) | RegistrationError::Repository(_) => {
                tracing::error!("Registration failed: {}", err);
                ApiError::internal("Could not create account")
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match &err {
            RepositoryError::DuplicateEmail(_) => {
                ApiError::conflict("A user with this email already exists")
            }
            RepositoryError::NotFound(_) => ApiError::not_found("User not found"),
        }
    }
}

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: HashMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the error of a `Result`-returning validator, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    /// Build the ApiError if there are any errors
    pub fn build(self) -> Option<ApiError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(ApiError::validation(self.errors))
        }
    }

    /// Return Ok(()) if no errors, or Err(ApiError) if there are errors
    pub fn finish(self) -> Result<(), ApiError> {
        match self.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::not_found("User not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), "User not found");
        assert_eq!(err.to_string(), "[not_found] User not found");
    }

    #[test]
    fn test_validation_error_single_field() {
        let err = ApiError::validation_field("name", "Name is required");
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.message(), "Name is required");
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let mut errors = HashMap::new();
        errors.insert("name".to_string(), vec!["Name is required".to_string()]);
        errors.insert("email".to_string(), vec!["Invalid email format".to_string()]);

        let err = ApiError::validation(errors);
        assert!(err.message().contains("2 fields"));
    }

    #[test]
    fn test_validation_error_builder() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("name", "Name is required");
        builder.check("email", Err("Invalid email format".to_string()));
        builder.check("department", Ok(()));
        builder.add("name", "Name is too short");

        let err = builder.build().unwrap();
        match err.details() {
            Some(ErrorDetails::ValidationErrors(errors)) => {
                assert_eq!(errors.get("name").unwrap().len(), 2);
                assert_eq!(errors.get("email").unwrap().len(), 1);
                assert!(!errors.contains_key("department"));
            }
            None => panic!("Expected ValidationErrors details"),
        }
    }

    #[test]
    fn test_empty_builder_finishes_ok() {
        assert!(ValidationErrorBuilder::new().finish().is_ok());
    }

    #[test]
    fn test_auth_error_is_generic() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "Invalid email or password");
    }

    #[test]
    fn test_registration_error_messages() {
        assert_eq!(
            RegistrationError::PasswordTooShort { min: 8 }.to_string(),
            "Password must be at least 8 characters long"
        );
        let err: ApiError = RegistrationError::DuplicateEmail.into();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }
}
