//! Input validation for form submissions.
//!
//! Validators return `Result<(), String>` with a user-facing message; collect
//! several with the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose email shape check: something@domain.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();
}

/// Minimum length counted toward password strength
const STRENGTH_MIN_LENGTH: usize = 8;

/// Validate a required text field
pub fn validate_required(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    Weak,
    Moderate,
    Good,
    Strong,
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrengthLabel::Weak => write!(f, "Weak"),
            StrengthLabel::Moderate => write!(f, "Moderate"),
            StrengthLabel::Good => write!(f, "Good"),
            StrengthLabel::Strong => write!(f, "Strong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    /// One of 0, 25, 50, 75, 100
    pub score: u8,
    pub label: StrengthLabel,
}

/// Score a password for the live strength meter.
///
/// Length of at least 8, an ASCII uppercase letter, an ASCII digit and a
/// character outside `[A-Za-z0-9]` each add 25 points. Length counts Unicode
/// scalar values, not UTF-16 code units.
pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= STRENGTH_MIN_LENGTH,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8 * 25;

    let label = match score {
        0..=25 => StrengthLabel::Weak,
        26..=50 => StrengthLabel::Moderate,
        51..=75 => StrengthLabel::Good,
        _ => StrengthLabel::Strong,
    };

    PasswordStrength { score, label }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("jane.smith@qms.example.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("space @example.com").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Name", "Jane").is_ok());
        assert_eq!(validate_required("Name", "  "), Err("Name is required".to_string()));
    }

    #[test]
    fn test_password_strength_buckets() {
        let cases = [
            ("abc", 0, StrengthLabel::Weak),
            ("abcdefgh", 25, StrengthLabel::Weak),
            ("Abcdefgh", 50, StrengthLabel::Moderate),
            ("Abcdefg1", 75, StrengthLabel::Good),
            ("Abcdefg1!", 100, StrengthLabel::Strong),
        ];

        for (password, score, label) in cases {
            let strength = password_strength(password);
            assert_eq!(strength.score, score, "score for {:?}", password);
            assert_eq!(strength.label, label, "label for {:?}", password);
        }
    }

    #[test]
    fn test_password_strength_non_ascii_counts_as_special() {
        let strength = password_strength("é");
        assert_eq!(strength.score, 25);
        assert_eq!(strength.label, StrengthLabel::Weak);
    }

    #[test]
    fn test_password_strength_empty() {
        assert_eq!(password_strength("").score, 0);
    }
}
