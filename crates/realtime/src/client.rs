use crate::error::RealtimeError;
use crate::message::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Connection state of the notification socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Live unread-count channel for the admin console.
///
/// One instance maps to one admin-layout mount: [`connect`](Self::connect)
/// when the layout appears, [`disconnect`](Self::disconnect) (or drop) when it
/// goes away. There is no reconnect; after a drop the count keeps its last
/// value until the next `connect`.
pub struct NotificationSocket {
    pub(crate) url: String,
    state: Arc<RwLock<ConnectionState>>,
    state_change: broadcast::Sender<ConnectionState>,
    unread_tx: Arc<watch::Sender<u64>>,
    unread_rx: watch::Receiver<u64>,
    outbound: Arc<RwLock<Option<mpsc::Sender<Message>>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationSocket {
    pub fn new(url: &str) -> Self {
        let (state_change_tx, _) = broadcast::channel(16);
        let (unread_tx, unread_rx) = watch::channel(0);
        Self {
            url: url.to_string(),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            state_change: state_change_tx,
            unread_tx: Arc::new(unread_tx),
            unread_rx,
            outbound: Arc::new(RwLock::new(None)),
            task: Mutex::new(None),
        }
    }

    pub fn on_state_change(&self) -> broadcast::Receiver<ConnectionState> {
        self.state_change.subscribe()
    }

    pub async fn get_connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Latest unread count pushed by the server.
    pub fn unread_count(&self) -> u64 {
        *self.unread_rx.borrow()
    }

    /// Watch the unread count; every push replaces the value.
    pub fn subscribe_unread(&self) -> watch::Receiver<u64> {
        self.unread_rx.clone()
    }

    /// Socket URL with the access token attached as a query parameter.
    pub fn endpoint(&self, access_token: &str) -> Result<Url, RealtimeError> {
        let mut url = Url::parse(&self.url)?;
        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            s => {
                return Err(RealtimeError::ConnectionError(format!(
                    "Unsupported URL scheme: {}",
                    s
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| RealtimeError::ConnectionError("Cannot set socket scheme".to_string()))?;
        url.query_pairs_mut().append_pair("token", access_token);
        Ok(url)
    }

    /// Open the socket, send the authentication frame and start the reader.
    pub async fn connect(&self, access_token: &str) -> Result<(), RealtimeError> {
        if self.get_connection_state().await != ConnectionState::Disconnected {
            return Err(RealtimeError::ConnectionError(
                "Socket already open".to_string(),
            ));
        }

        let url = self.endpoint(access_token)?;
        Self::set_state(&self.state, &self.state_change, ConnectionState::Connecting).await;
        info!("Connecting notification socket to {}", self.url);

        let ws_stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                error!("Notification socket connection failed: {}", e);
                Self::set_state(&self.state, &self.state_change, ConnectionState::Disconnected).await;
                return Err(RealtimeError::ConnectionError(format!(
                    "WebSocket connection failed: {}",
                    e
                )));
            }
        };

        let (mut write, mut read) = ws_stream.split();

        let hello = serde_json::to_string(&ClientMessage::Authenticate {
            token: access_token.to_string(),
        })?;
        if let Err(e) = write.send(Message::Text(hello)).await {
            Self::set_state(&self.state, &self.state_change, ConnectionState::Disconnected).await;
            return Err(e.into());
        }

        Self::set_state(&self.state, &self.state_change, ConnectionState::Connected).await;

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(8);
        *self.outbound.write().await = Some(outbound_tx);

        let state = self.state.clone();
        let state_change = self.state_change.clone();
        let unread_tx = self.unread_tx.clone();
        let outbound = self.outbound.clone();

        let handle = tokio::spawn(async move {
            debug!("Notification reader started");
            loop {
                tokio::select! {
                    incoming = read.next() => match incoming {
                        Some(Ok(Message::Text(text))) => Self::handle_text(&text, &unread_tx),
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Server closed notification socket: {:?}", frame);
                            break;
                        }
                        Some(Ok(other)) => trace!("Ignoring non-text frame: {:?}", other),
                        Some(Err(e)) => {
                            error!("Notification socket read error: {}", e);
                            break;
                        }
                        None => {
                            debug!("Notification socket stream ended");
                            break;
                        }
                    },
                    outgoing = outbound_rx.recv() => match outgoing {
                        Some(message) => {
                            let closing = message.is_close();
                            if let Err(e) = write.send(message).await {
                                error!("Notification socket send error: {}", e);
                                break;
                            }
                            if closing {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            *outbound.write().await = None;
            Self::set_state(&state, &state_change, ConnectionState::Disconnected).await;
            debug!("Notification reader finished");
        });

        *self.task.lock().await = Some(handle);
        Ok(())
    }

    fn handle_text(text: &str, unread_tx: &watch::Sender<u64>) {
        match ServerMessage::parse(text) {
            Ok(ServerMessage::AuthSuccess { message }) => {
                info!("Notification socket authenticated {}", message.unwrap_or_default());
            }
            Ok(ServerMessage::UnreadCount { count }) => {
                trace!("Unread count is now {}", count);
                unread_tx.send_replace(count);
            }
            Ok(ServerMessage::Unknown) => debug!("Ignoring unknown frame: {}", text),
            Err(e) => warn!("Unparseable notification frame ({}): {}", e, text),
        }
    }

    /// Close the socket and wait for the reader to stop.
    pub async fn disconnect(&self) -> Result<(), RealtimeError> {
        let sender = self.outbound.read().await.clone();
        match sender {
            Some(tx) => {
                if tx.send(Message::Close(None)).await.is_err() {
                    debug!("Reader already gone while closing");
                }
            }
            None => warn!("disconnect(): socket not open"),
        }

        if let Some(handle) = self.task.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Notification reader ended abnormally: {}", e);
            }
        }

        Self::set_state(&self.state, &self.state_change, ConnectionState::Disconnected).await;
        Ok(())
    }

    async fn set_state(
        state_arc: &Arc<RwLock<ConnectionState>>,
        state_change_tx: &broadcast::Sender<ConnectionState>,
        state: ConnectionState,
    ) {
        let mut current = state_arc.write().await;
        if *current != state {
            trace!("Socket state {:?} -> {:?}", *current, state);
            *current = state;
            let _ = state_change_tx.send(state);
        }
    }
}

impl Drop for NotificationSocket {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.try_lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}
