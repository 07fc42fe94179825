//! HTTP client for the CRM authentication endpoints.
//!
//! `ApiClient` owns the reqwest connection pool and the deployment-configured
//! base URL. It implements the `AuthApi` port the session manager drives,
//! plus the one unauthenticated call (signup).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::auth::AuthApi;
use crate::config::Config;
use crate::models::{NewUser, User};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token grant returned by the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
}

/// Client for the CRM API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Register a new user account. The server requires every field, so
    /// empties are rejected before the request goes out.
    pub async fn sign_up(&self, user: &NewUser) -> Result<User> {
        let fields = [
            &user.username,
            &user.email,
            &user.phone,
            &user.first_name,
            &user.last_name,
            &user.password,
        ];
        if fields.iter().any(|field| field.is_empty()) {
            return Err(ApiError::Authentication("All fields are required".to_string()).into());
        }

        let url = format!("{}/users", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(user)
            .send()
            .await
            .context("Failed to send signup request")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Authentication(ApiError::detail_from_body(&body)).into());
        }

        let created: User = response
            .json()
            .await
            .context("Failed to parse signup response")?;
        Ok(created)
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn request_token(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let url = format!("{}/auth/token", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .context("Failed to send login request")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(body = %body, "Login rejected");
            return Err(ApiError::Authentication(ApiError::detail_from_body(&body)).into());
        }

        let grant: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        Ok(grant)
    }

    async fn refresh_token(&self, token: &str) -> Result<TokenResponse> {
        let url = format!("{}/auth/token/refresh", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send refresh request")?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Refresh rejected");
            return Err(ApiError::SessionExpired.into());
        }

        let grant: TokenResponse = response
            .json()
            .await
            .context("Failed to parse refresh response")?;
        Ok(grant)
    }

    async fn verify_token(&self, token: &str) -> Result<()> {
        let url = format!("{}/auth/token/verify", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send verify request")?;

        if !response.status().is_success() {
            return Err(ApiError::SessionExpired.into());
        }
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        let url = format!("{}/users/me", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send identity request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let user: User = response
            .json()
            .await
            .context("Failed to parse identity response")?;
        Ok(user)
    }

    async fn delete_current_user(&self, token: &str) -> Result<()> {
        let url = format!("{}/users/me", self.base_url);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send account deletion request")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Authentication(ApiError::detail_from_body(&body)).into());
        }
        Ok(())
    }
}
