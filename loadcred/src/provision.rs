//! Synthetic account material: generated usernames and the user record sent
//! to the admin API.

use rand::Rng;

use crate::admin::{CredentialRepresentation, UserRepresentation};
use crate::config::Settings;

/// `<prefix><random 1..=10000>`. Uniqueness is NOT guaranteed; a collision
/// surfaces as a 409 from the provider and skips that user.
pub fn generate_username(prefix: &str) -> String {
    let suffix = rand::rng().random_range(1..=10_000);
    format!("{prefix}{suffix}")
}

pub fn derive_email(username: &str, domain: &str) -> String {
    format!("{username}@{domain}")
}

/// Build the record for the admin users endpoint: enabled immediately, with
/// the shared non-temporary password.
pub fn user_representation(settings: &Settings, username: &str) -> UserRepresentation {
    UserRepresentation {
        username: username.to_string(),
        email: derive_email(username, &settings.email_domain),
        enabled: true,
        first_name: settings.first_name.clone(),
        last_name: settings.last_name.clone(),
        credentials: vec![CredentialRepresentation::password(&settings.common_password)],
    }
}
