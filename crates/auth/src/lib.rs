//! Interiora Auth client for Rust
//!
//! Login, registration, one-time passwords, password reset and access-token
//! refresh against the Interiora API, plus the [`TokenStore`] abstraction that
//! holds the resulting session.

mod store;

pub use store::{FileTokenStore, MemoryTokenStore, Session, TokenStore, ADMIN_ROLE};

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Auth endpoint paths, relative to the versioned API root.
pub mod endpoints {
    pub const LOGIN: &str = "auth/login/";
    pub const REGISTER: &str = "auth/register/";
    pub const REFRESH: &str = "auth/token/refresh/";
    pub const OTP_SEND: &str = "auth/otp/send/";
    pub const OTP_VERIFY: &str = "auth/otp/verify/";
    pub const PASSWORD_RESET_REQUEST: &str = "auth/password-reset/request/";
    pub const PASSWORD_RESET_VERIFY: &str = "auth/password-reset/verify/";
    pub const PASSWORD_RESET_CONFIRM: &str = "auth/password-reset/confirm/";
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Refresh token rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Missing session")]
    MissingSession,

    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Account creation payload.
#[derive(Debug, Clone, Serialize, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Auth client
pub struct AuthClient {
    base_url: String,
    http_client: Client,
    store: Arc<dyn TokenStore>,
}

impl AuthClient {
    /// Create a new auth client rooted at the versioned API URL.
    pub fn new(api_url: &str, http_client: Client, store: Arc<dyn TokenStore>) -> Self {
        Self {
            base_url: api_url.trim_end_matches('/').to_string(),
            http_client,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    fn url(&self, path: &str) -> Result<Url, AuthError> {
        let base = Url::parse(&format!("{}/", self.base_url))?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    async fn post_unauthenticated(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<reqwest::Response, AuthError> {
        let response = self
            .http_client
            .post(self.url(path)?)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::ApiError { status, message });
        }

        Ok(response)
    }

    /// Log in with email and password. The session is stored before returning.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self.post_unauthenticated(endpoints::LOGIN, &payload).await?;
        let login: LoginResponse = response.json().await?;
        let session = Session {
            access_token: login.access,
            refresh_token: login.refresh,
            role: login.role,
        };

        self.store.set(session.clone())?;
        info!("Logged in (role: {})", session.role.as_deref().unwrap_or("none"));

        Ok(session)
    }

    /// Create an account. The server answers with the created user.
    pub async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, AuthError> {
        let payload = serde_json::to_value(request)?;
        let response = self.post_unauthenticated(endpoints::REGISTER, &payload).await?;
        Ok(response.json().await?)
    }

    /// Ask the server to email a one-time password.
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthError> {
        let payload = serde_json::json!({ "email": email });
        self.post_unauthenticated(endpoints::OTP_SEND, &payload).await?;
        Ok(())
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        let payload = serde_json::json!({ "email": email, "otp": otp });
        self.post_unauthenticated(endpoints::OTP_VERIFY, &payload).await?;
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let payload = serde_json::json!({ "email": email });
        self.post_unauthenticated(endpoints::PASSWORD_RESET_REQUEST, &payload)
            .await?;
        Ok(())
    }

    pub async fn verify_password_reset(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let payload = serde_json::json!({ "email": email, "code": code });
        self.post_unauthenticated(endpoints::PASSWORD_RESET_VERIFY, &payload)
            .await?;
        Ok(())
    }

    /// Commit a new password using a verified reset code.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let payload = serde_json::json!({
            "email": email,
            "code": code,
            "new_password": new_password,
        });
        self.post_unauthenticated(endpoints::PASSWORD_RESET_CONFIRM, &payload)
            .await?;
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// The new token is written to the store and returned. This makes a
    /// single attempt; callers decide what a failure means.
    pub async fn refresh(&self) -> Result<String, AuthError> {
        let session = self.store.get().ok_or(AuthError::MissingSession)?;
        debug!("Refreshing access token");

        let response = self
            .http_client
            .post(self.url(endpoints::REFRESH)?)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "refresh": session.refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!("Refresh rejected with status {}", status);
            return Err(AuthError::RefreshRejected { status, message });
        }

        let refreshed: RefreshResponse = response.json().await?;
        self.store.set_access_token(&refreshed.access)?;
        debug!("Access token refreshed");

        Ok(refreshed.access)
    }

    /// Forget the session locally.
    pub fn logout(&self) {
        self.store.clear();
        info!("Logged out");
    }

    pub fn session(&self) -> Option<Session> {
        self.store.get()
    }
}
