//! Error handling for the Interiora client

use std::fmt;
use thiserror::Error;

/// Unified error type for the Interiora client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Errors from the auth endpoints or the token store
    #[error("Authentication error: {0}")]
    Auth(#[from] interiora_auth::AuthError),

    /// Notification socket errors
    #[error("Realtime error: {0}")]
    Realtime(#[from] interiora_realtime::RealtimeError),

    /// The server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Refreshing the access token failed; the session has been cleared
    #[error("Session expired, please log in again")]
    SessionExpired(#[source] interiora_auth::AuthError),

    /// Required input is missing; nothing was sent
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("The cart is empty")]
    EmptyCart,

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: String, action: &'static str },

    /// Payment provider declined or could not confirm
    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn payment<T: fmt::Display>(msg: T) -> Self {
        Error::Payment(msg.to_string())
    }

    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    pub fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::Validation(fields.into_iter().map(Into::into).collect())
    }

    /// Message suitable for an inline error or toast.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Payment(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Build an [`Error::Api`] from a failed response body.
    ///
    /// JSON bodies carrying `detail`, `message` or `error` use that field;
    /// anything else is passed through as text.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| body.to_string());

        let message = if message.trim().is_empty() {
            format!("Request failed with status {}", status)
        } else {
            message
        };

        Error::Api { status, message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
