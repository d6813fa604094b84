use crate::{api::ApiError, validation::ValidationError};

pub type Result<T> = std::result::Result<T, SyncError>;

pub(crate) const LOGIN_FAILED: &str = "login failed";
pub(crate) const MISSING_USER: &str = "Failed to retrieve user ID.";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("User is not logged in.")]
    NotLoggedIn,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The backend refused the credentials.
    #[error("{0}")]
    Rejected(String),
}

impl SyncError {
    /// Message suitable for showing next to the form that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotLoggedIn => self.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Api(ApiError::Network(err)) => format!("Server unreachable: {err}"),
            Self::Api(err) => err.detail(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_network())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn server_errors_show_raw_body() {
        let err = SyncError::from(ApiError::Server {
            status: StatusCode::CONFLICT,
            body: Some("email taken".to_string()),
        });
        assert_eq!(err.user_message(), "email taken");
        assert!(!err.is_network());
    }

    #[test]
    fn validation_errors_keep_form_message() {
        let err = SyncError::from(ValidationError::PasswordTooShort);
        assert_eq!(err.user_message(), "Password must be at least 6 characters.");
    }

    #[test]
    fn not_logged_in_message() {
        assert_eq!(SyncError::NotLoggedIn.user_message(), "User is not logged in.");
    }
}
