//! Configuration options for the Interiora client

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Configuration options for the Interiora client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Whether the session survives restarts (needs `session_path`)
    pub persist_session: bool,

    /// Where the session file lives when persisted
    pub session_path: Option<PathBuf>,

    /// Page size requested by the notification feed
    pub notifications_page_size: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            persist_session: true,
            session_path: None,
            notifications_page_size: 10,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    pub fn with_notifications_page_size(mut self, value: u32) -> Self {
        self.notifications_page_size = value.max(1);
        self
    }
}

/// Endpoints plus options.
#[derive(Debug, Clone)]
pub struct InterioraConfig {
    /// Versioned API root, e.g. `https://api.example.com/api/v1/`
    pub api_url: Url,
    /// Notification socket, e.g. `wss://api.example.com/ws/notifications/`
    pub socket_url: Url,
    pub options: ClientOptions,
}

impl InterioraConfig {
    /// Creates a new configuration, validating both URLs.
    pub fn new(api_url: &str, socket_url: &str) -> Result<Self> {
        let api_url = Url::parse(api_url)?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "API URL must be http(s), got {}",
                api_url.scheme()
            )));
        }

        let socket_url = Url::parse(socket_url)?;
        if !matches!(socket_url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "socket URL must be ws(s), got {}",
                socket_url.scheme()
            )));
        }

        Ok(Self {
            api_url,
            socket_url,
            options: ClientOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Reads `INTERIORA_API_URL`, `INTERIORA_SOCKET_URL` and the optional
    /// `INTERIORA_SESSION_PATH`.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("INTERIORA_API_URL")
            .map_err(|_| Error::config("INTERIORA_API_URL environment variable not found"))?;
        let socket_url = std::env::var("INTERIORA_SOCKET_URL")
            .map_err(|_| Error::config("INTERIORA_SOCKET_URL environment variable not found"))?;

        let mut options = ClientOptions::default();
        if let Ok(path) = std::env::var("INTERIORA_SESSION_PATH") {
            options = options.with_session_path(path);
        }

        Ok(Self::new(&api_url, &socket_url)?.with_options(options))
    }
}
