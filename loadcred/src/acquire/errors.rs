use std::time::Duration;

use thiserror::Error;

/// Per-user acquisition failures. None of these abort the run; the loop
/// records the reason and moves to the next user.
#[derive(Debug, Error, Clone)]
pub enum AcquireError {
    #[error("No redirect URL in login response")]
    MissingRedirect,

    #[error("Could not extract form action from login page")]
    FormActionNotFound,

    #[error("Login did not reach the post-login URL within {0:?}")]
    LoginTimeout(Duration),

    #[error("Token grant rejected ({status}): {body}")]
    TokenGrantRejected { status: u16, body: String },

    /// Strict cookie policy: the walk finished but expected cookies are absent.
    #[error("Missing session cookies: {0}")]
    MissingCookies(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Http error: {0}")]
    Http(String),

    #[error("Browser error: {0}")]
    Browser(String),
}
