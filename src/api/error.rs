//! Shared error handling for API calls.

use reqwest::StatusCode;
use serde::Deserialize;

/// Per-field messages from a rejected registration, shaped so a caller
/// can attach each message to the offending form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        if let Some(email) = &self.email {
            write!(f, "email: {}", email)?;
            first = false;
        }
        if let Some(password) = &self.password {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "password: {}", password)?;
        }
        Ok(())
    }
}

/// Errors a caller can see from the API layer. Raw transport errors are
/// wrapped here and never leak past it.
#[derive(Debug)]
pub enum ApiError {
    /// Credentials rejected, or the session expired beyond refresh.
    Unauthorized,
    /// Server-side validation failure keyed by field.
    Validation(FieldErrors),
    /// Network or protocol failure below the API layer.
    Transport(reqwest::Error),
    /// Any other non-success response, with whatever body came with it.
    Status(StatusCode, String),
    /// Malformed endpoint path or base URL.
    Url(url::ParseError),
}

impl ApiError {
    /// Message suitable for direct display. Transport and server details
    /// stay in the logs, not in front of the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "Wrong login or password",
            ApiError::Validation(_) => "Please correct the highlighted fields",
            _ => "Something went wrong",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Validation(fields) => write!(f, "Validation failed: {}", fields),
            ApiError::Transport(e) => write!(f, "Transport error: {}", e),
            ApiError::Status(status, body) => {
                if body.is_empty() {
                    write!(f, "Unexpected response: {}", status)
                } else {
                    write!(f, "Unexpected response: {} ({})", status, body)
                }
            }
            ApiError::Url(e) => write!(f, "Invalid URL: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            ApiError::Url(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::Url(e)
    }
}
