//! Page access rules for authenticated and anonymous visitors.

use crate::db::{Permission, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    UserManagement,
    Other(String),
}

impl Page {
    /// Classify a page path by the file it names
    pub fn from_path(path: &str) -> Self {
        if path.contains("forgot-password.html") {
            Page::ForgotPassword
        } else if path.contains("register.html") {
            Page::Register
        } else if path.contains("index.html") || path.contains("login.html") {
            Page::Login
        } else if path.contains("user-management.html") {
            Page::UserManagement
        } else if path.contains("dashboard.html") {
            Page::Dashboard
        } else {
            Page::Other(path.to_string())
        }
    }

    /// Login, registration and password recovery
    pub fn is_auth_page(&self) -> bool {
        matches!(self, Page::Login | Page::Register | Page::ForgotPassword)
    }

    pub fn path(&self) -> &str {
        match self {
            Page::Login => "index.html",
            Page::Register => "pages/register.html",
            Page::ForgotPassword => "pages/forgot-password.html",
            Page::Dashboard => "pages/dashboard.html",
            Page::UserManagement => "pages/user-management.html",
            Page::Other(path) => path,
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Page),
}

/// Decide whether `page` may be shown for `session`.
pub fn check_access(session: Option<&Session>, page: &Page) -> Access {
    match session {
        Some(_) if page.is_auth_page() => Access::Redirect(Page::Dashboard),
        Some(s) if *page == Page::UserManagement && !s.grants(Permission::ManageUsers) => {
            Access::Redirect(Page::Dashboard)
        }
        Some(_) => Access::Allow,
        None if page.is_auth_page() => Access::Allow,
        None => Access::Redirect(Page::Login),
    }
}
