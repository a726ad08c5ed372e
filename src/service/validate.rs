//! Pre-flight field validation.
//!
//! These checks run before any request is built; a failure raises the
//! operation's specific message without touching the network.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::ServiceError;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Require a non-blank value, raising `message` otherwise.
pub fn require(value: &str, message: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(message.to_string()));
    }
    Ok(())
}

/// Validate an email address against the standard pattern.
pub fn email(value: &str) -> Result<(), ServiceError> {
    if !EMAIL_PATTERN.is_match(value.trim()) {
        return Err(ServiceError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }
    Ok(())
}

/// Require the phone number to carry an international `+` prefix.
pub fn msisdn_prefix(value: &str) -> Result<(), ServiceError> {
    if !value.trim().starts_with('+') {
        return Err(ServiceError::Validation(
            "Phone number must start with '+' followed by the country code.".to_string(),
        ));
    }
    Ok(())
}

/// Require a password of at least `min` characters.
pub fn min_password(value: &str, min: usize) -> Result<(), ServiceError> {
    if value.chars().count() < min {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {min} characters long."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank_values() {
        let err = require("   ", "Company name is required.").unwrap_err();
        assert_eq!(err.to_string(), "Company name is required.");
        assert!(require("Acme Ltd", "Company name is required.").is_ok());
    }

    #[test]
    fn email_accepts_ordinary_addresses() {
        assert!(email("ops@example.com").is_ok());
        assert!(email("a.b+tag@sub.domain.io").is_ok());
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for bad in ["not-an-email", "missing@tld", "two@@example.com", "a b@example.com"] {
            let err = email(bad).unwrap_err();
            assert_eq!(err.to_string(), "Please enter a valid email address.");
        }
    }

    #[test]
    fn msisdn_requires_a_plus_prefix() {
        assert!(msisdn_prefix("+254700000001").is_ok());
        let err = msisdn_prefix("0700000001").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Phone number must start with '+' followed by the country code."
        );
    }

    #[test]
    fn password_length_is_enforced() {
        assert!(min_password("secret", 6).is_ok());
        let err = min_password("short", 6).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password must be at least 6 characters long."
        );
    }
}
