//! Caller-side field validation for the login form.
//!
//! The [`crate::Authenticator`] accepts any strings; empty or malformed input
//! is rejected here, before an attempt is made.

use thiserror::Error;

/// A form control that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    Password,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("Email is required.")]
    EmailRequired,
    #[error("Enter a valid email address.")]
    EmailInvalid,
    #[error("Password is required.")]
    PasswordRequired,
}

impl FieldError {
    pub fn field(self) -> Field {
        match self {
            Self::EmailRequired | Self::EmailInvalid => Field::Email,
            Self::PasswordRequired => Field::Password,
        }
    }
}

/// Every field error found in one validation pass, in form order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<FieldError> {
        self.0.first().copied()
    }

    pub fn for_field(&self, field: Field) -> Option<FieldError> {
        self.0.iter().copied().find(|e| e.field() == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldError> + '_ {
        self.0.iter().copied()
    }

    pub fn clear_field(&mut self, field: Field) {
        self.0.retain(|e| e.field() != field);
    }
}

/// Input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Trimmed email.
    pub email: String,
    /// Password exactly as typed.
    pub password: String,
}

/// Validates the two login fields.
pub fn validate(email: &str, password: &str) -> Result<Credentials, ValidationErrors> {
    let mut errors = Vec::new();

    let email = email.trim();
    if let Err(e) = validate_email(email) {
        errors.push(e);
    }
    if password.is_empty() {
        errors.push(FieldError::PasswordRequired);
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(Credentials {
        email: email.to_owned(),
        password: password.to_owned(),
    })
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.trim().is_empty() {
        return Err(FieldError::EmailRequired);
    }
    if !is_valid_email(email.trim()) {
        return Err(FieldError::EmailInvalid);
    }
    Ok(())
}

/// Syntactic email check: `local@domain.tld`, no whitespace, one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed_input() {
        let creds = validate("  a@b.com ", " pw ").expect("valid input");

        assert_eq!(creds.email, "a@b.com");
        assert_eq!(creds.password, " pw ", "password is not trimmed");
    }

    #[test]
    fn test_reports_both_fields_in_order() {
        let errors = validate("", "").expect_err("empty input");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first(), Some(FieldError::EmailRequired));
        assert_eq!(
            errors.for_field(Field::Password),
            Some(FieldError::PasswordRequired)
        );
    }

    #[test]
    fn test_whitespace_only_email_is_required_error() {
        assert_eq!(validate_email("   "), Err(FieldError::EmailRequired));
    }

    #[test]
    fn test_malformed_emails_are_rejected() {
        for email in [
            "plain",
            "@b.com",
            "a@",
            "a@b",
            "a@b.",
            "a@.com",
            "a@@b.com",
            "a@b@c.com",
            "a b@c.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }
    }

    #[test]
    fn test_common_emails_are_accepted() {
        for email in ["a@b.com", "jane.doe+tag@example.co.uk", "X@Y.IO"] {
            assert!(is_valid_email(email), "{email} should be accepted");
        }
    }

    #[test]
    fn test_clear_field_drops_only_that_field() {
        let mut errors = validate("", "").expect_err("empty input");

        errors.clear_field(Field::Email);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.for_field(Field::Email), None);
    }

    #[test]
    fn test_field_error_messages() {
        assert_eq!(FieldError::EmailRequired.to_string(), "Email is required.");
        assert_eq!(
            FieldError::EmailInvalid.to_string(),
            "Enter a valid email address."
        );
        assert_eq!(
            FieldError::PasswordRequired.to_string(),
            "Password is required."
        );
    }
}
