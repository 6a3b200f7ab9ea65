use serde::{Deserialize, Serialize};

/// User record POSTed to the admin users endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub first_name: String,
    pub last_name: String,
    pub credentials: Vec<CredentialRepresentation>,
}

/// Password credential attached to a new user. Non-temporary so the account
/// can log in without a forced reset.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialRepresentation {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub temporary: bool,
}

impl CredentialRepresentation {
    pub fn password(value: &str) -> Self {
        Self {
            kind: "password".to_string(),
            value: value.to_string(),
            temporary: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AdminTokenResponse {
    pub access_token: String,
}

/// Subset of the user object returned by the admin lookup endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct UserSummary {
    pub id: String,
}

/// Subset of the group objects returned by the groups listing.
#[derive(Debug, Deserialize)]
pub(super) struct GroupSummary {
    pub id: String,
    pub name: String,
}
