use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Centralized validation for the postern security toolkit
///
/// A single source of truth for email and password validation, so every
/// entry point applies the same rules.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

static HAS_LOWERCASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]").expect("Invalid lowercase regex pattern"));

static HAS_UPPERCASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("Invalid uppercase regex pattern"));

static HAS_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("Invalid digit regex pattern"));

/// Validates an email address
///
/// # Returns
///
/// Returns `Ok(())` if the email is valid, or a `ValidationError::InvalidEmail` if invalid.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

/// Validates a password according to security requirements
///
/// # Password Requirements
///
/// - Minimum 8 characters, maximum 128
/// - At least one lowercase letter, one uppercase letter, and one digit
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.len() < 8 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ValidationError::InvalidPassword(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    if !HAS_LOWERCASE.is_match(password) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !HAS_UPPERCASE.is_match(password) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !HAS_DIGIT.is_match(password) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }

    Ok(())
}

/// Normalize an email address for storage and lookup.
///
/// Every store interaction goes through this. Callers that skip it create
/// duplicate shadow rows keyed by case variants of the same address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
