use reqwest::StatusCode;

use crate::admin::errors::AdminError;
use crate::admin::types::{AdminTokenResponse, GroupSummary, UserRepresentation, UserSummary};
use crate::config::Settings;

/// Bearer-authenticated client for the provider's admin endpoints.
///
/// One instance serves a whole run; the token it hands out is obtained once
/// and reused for every user.
pub struct AdminApi {
    client: reqwest::Client,
    token_url: String,
    users_url: String,
    groups_url: String,
    admin_client_id: String,
    admin_client_secret: Option<String>,
    admin_username: String,
    admin_password: String,
}

impl AdminApi {
    pub fn new(settings: &Settings) -> Result<Self, AdminError> {
        let mut builder = reqwest::Client::builder().timeout(settings.request_timeout);
        if settings.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(|e| AdminError::Http(e.to_string()))?;

        Ok(Self {
            client,
            token_url: settings.token_url(),
            users_url: settings.admin_users_url(),
            groups_url: settings.admin_groups_url(),
            admin_client_id: settings.admin_client_id.clone(),
            admin_client_secret: settings.admin_client_secret.clone(),
            admin_username: settings.admin_username.clone(),
            admin_password: settings.admin_password.clone(),
        })
    }

    /// Obtain the admin access token with a resource-owner-password grant.
    ///
    /// Any non-success status is fatal for the whole run; there is no retry.
    pub async fn obtain_admin_token(&self) -> Result<String, AdminError> {
        let mut form = vec![
            ("client_id", self.admin_client_id.as_str()),
            ("username", self.admin_username.as_str()),
            ("password", self.admin_password.as_str()),
            ("grant_type", "password"),
        ];
        if let Some(secret) = &self.admin_client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AdminError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::TokenRequest(format!("{status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdminError::Http(e.to_string()))?;
        let token: AdminTokenResponse =
            serde_json::from_str(&body).map_err(|e| AdminError::TokenParse(e.to_string()))?;

        tracing::debug!("admin token obtained");
        Ok(token.access_token)
    }

    /// Create a user record. Success is exactly HTTP 201; anything else is a
    /// per-user failure and the run moves on.
    pub async fn create_user(
        &self,
        admin_token: &str,
        user: &UserRepresentation,
    ) -> Result<(), AdminError> {
        let response = self
            .client
            .post(&self.users_url)
            .bearer_auth(admin_token)
            .json(user)
            .send()
            .await
            .map_err(|e| AdminError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED => {
                tracing::info!(username = %user.username, "user created");
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AdminError::CreateUserRejected {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Resolve the opaque id of a freshly created user. First match wins.
    pub async fn user_id_by_username(
        &self,
        admin_token: &str,
        username: &str,
    ) -> Result<String, AdminError> {
        let response = self
            .client
            .get(&self.users_url)
            .query(&[("username", username)])
            .bearer_auth(admin_token)
            .send()
            .await
            .map_err(|e| AdminError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::UserLookup(format!("{status}: {body}")));
        }

        let users: Vec<UserSummary> = response
            .json()
            .await
            .map_err(|e| AdminError::UserLookup(e.to_string()))?;

        users
            .into_iter()
            .next()
            .map(|u| u.id)
            .ok_or_else(|| AdminError::UserNotFound(username.to_string()))
    }

    /// Add a user to a named group.
    ///
    /// The group id is looked up among all groups of the realm; a 204 on the
    /// membership PUT is the only success.
    pub async fn assign_group(
        &self,
        admin_token: &str,
        user_id: &str,
        group_name: &str,
    ) -> Result<(), AdminError> {
        let response = self
            .client
            .get(&self.groups_url)
            .bearer_auth(admin_token)
            .send()
            .await
            .map_err(|e| AdminError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::GroupLookup(format!("{status}: {body}")));
        }

        let groups: Vec<GroupSummary> = response
            .json()
            .await
            .map_err(|e| AdminError::GroupLookup(e.to_string()))?;

        let group_id = groups
            .into_iter()
            .find(|g| g.name == group_name)
            .map(|g| g.id)
            .ok_or_else(|| AdminError::GroupNotFound(group_name.to_string()))?;

        let url = format!("{}/{}/groups/{}", self.users_url, user_id, group_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(admin_token)
            .send()
            .await
            .map_err(|e| AdminError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                tracing::info!(user_id, group_name, "user added to group");
                Ok(())
            }
            status => Err(AdminError::GroupAssignRejected {
                status: status.as_u16(),
            }),
        }
    }
}
