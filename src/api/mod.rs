pub mod auth;
pub mod error;
pub mod guard;
pub mod users;
pub mod validation;

pub use auth::{has_permission, AuthService, RegistrationForm, ResetNotice};
pub use error::{ApiError, AuthError, ErrorCode, RegistrationError};
pub use guard::{check_access, Access, Page};
pub use users::{UserDirectory, UserFilter, UserForm};
