//! Strategy C: skip the interactive login and ask the token endpoint
//! directly for a password grant with the product client.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::acquire::errors::AcquireError;
use crate::acquire::types::{BundleKind, SessionBundle, TokenBundle};
use crate::acquire::SessionAcquirer;
use crate::config::Settings;

pub struct TokenGrantAcquirer {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl TokenGrantAcquirer {
    pub fn new(settings: &Settings) -> Result<Self, AcquireError> {
        let mut builder = reqwest::Client::builder().timeout(settings.request_timeout);
        if settings.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| AcquireError::Http(e.to_string()))?;

        Ok(Self {
            client,
            token_url: settings.token_url(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            scope: settings.token_scope.clone(),
        })
    }
}

#[async_trait]
impl SessionAcquirer for TokenGrantAcquirer {
    async fn acquire(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionBundle, AcquireError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AcquireError::TokenGrantRejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;
        let tokens: TokenBundle =
            serde_json::from_str(&body).map_err(|e| AcquireError::Serde(e.to_string()))?;

        tracing::debug!(username, "tokens fetched");
        Ok(SessionBundle::Tokens(tokens))
    }

    fn bundle_kind(&self) -> BundleKind {
        BundleKind::Tokens
    }
}
