use std::sync::LazyLock;

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_+&*-]+(\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$")
        .expect("email pattern compiles")
});

#[allow(clippy::expect_used)]
static DATE_OF_BIRTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
    #[error("Please enter a valid date of birth (YYYY-MM-DD).")]
    InvalidDateOfBirth,
}

/// Checks a sign-up form before anything is sent to the backend.
///
/// Rules are applied in order and the first failure wins:
/// - every field is non-empty
/// - the email has a plausible `local@domain.tld` shape
/// - the password has at least [`MIN_PASSWORD_LEN`] characters
/// - the date of birth is written `YYYY-MM-DD`
pub fn validate_sign_up(
    name: &str,
    email: &str,
    password: &str,
    dob: &str,
) -> Result<(), ValidationError> {
    if [name, email, password, dob]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ValidationError::MissingFields);
    }
    if !EMAIL.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !DATE_OF_BIRTH.is_match(dob) {
        return Err(ValidationError::InvalidDateOfBirth);
    }
    Ok(())
}
