use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AdminError {
    /// Token endpoint returned a non-success status. Fatal for the run.
    #[error("Admin token request failed: {0}")]
    TokenRequest(String),

    /// Token endpoint answered, but the body had no usable `access_token`.
    #[error("Admin token response could not be parsed: {0}")]
    TokenParse(String),

    /// User creation returned something other than 201.
    #[error("User creation rejected ({status}): {body}")]
    CreateUserRejected { status: u16, body: String },

    #[error("User lookup failed: {0}")]
    UserLookup(String),

    #[error("No user found for username {0}")]
    UserNotFound(String),

    #[error("Group lookup failed: {0}")]
    GroupLookup(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group assignment rejected ({status})")]
    GroupAssignRejected { status: u16 },

    #[error("Http error: {0}")]
    Http(String),
}
