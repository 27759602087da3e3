use serde::{Deserialize, Serialize};

/// Frames pushed by the server, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake acknowledgement sent right after the socket opens.
    AuthSuccess {
        #[serde(default)]
        message: Option<String>,
    },
    /// Current number of unread notifications for the user.
    UnreadCount { count: u64 },
    #[serde(other)]
    Unknown,
}

/// Frames the client sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Authenticate { token: String },
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
