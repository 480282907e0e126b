//! Field-level validation shared by the request schemas.

use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_FIELD_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    #[error("{field} is required")]
    Missing { field: &'static str },

    /// Body could not be decoded into the expected shape.
    #[error("{0}")]
    Malformed(String),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    require_text("email", value)?;
    if !is_valid_email(value) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "not a valid email address",
        });
    }
    Ok(())
}

pub(crate) fn require_password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password",
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Trims and lowercases an email so uniqueness is case-insensitive.
pub(crate) fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("g@x.com"));
        assert!(!is_valid_email("g@x"));
        assert!(!is_valid_email("no spaces@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn blank_text_is_empty() {
        assert_eq!(
            require_text("name", "   "),
            Err(ValidationError::Empty { field: "name" })
        );
    }

    #[test]
    fn long_text_is_rejected() {
        let long = "a".repeat(MAX_FIELD_LEN + 1);
        assert_eq!(
            require_text("role", &long).unwrap_err().to_string(),
            "role exceeds maximum length of 100 characters"
        );
        assert!(require_text("role", &"a".repeat(MAX_FIELD_LEN)).is_ok());
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(require_password("short").is_err());
        assert!(require_password("long-enough").is_ok());
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  G@X.Com "), "g@x.com");
    }
}
