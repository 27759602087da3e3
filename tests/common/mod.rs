#![allow(dead_code)]

use async_trait::async_trait;
use interiora::auth::{MemoryTokenStore, Session, TokenStore};
use interiora::config::InterioraConfig;
use interiora::error::{Error, Result};
use interiora::payments::{CardDetails, CardProcessor};
use interiora::routes::{Destination, Navigator};
use interiora::Interiora;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

/// Remembers every navigation request.
#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<Destination> {
        self.visited.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Destination> {
        self.visited().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) {
        self.visited.lock().unwrap().push(destination);
    }
}

/// Card processor that approves or declines and counts its calls.
pub struct FakeCardProcessor {
    decline: Mutex<bool>,
    calls: AtomicUsize,
}

impl FakeCardProcessor {
    pub fn approving() -> Self {
        Self {
            decline: Mutex::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            decline: Mutex::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_decline(&self, decline: bool) {
        *self.decline.lock().unwrap() = decline;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardProcessor for FakeCardProcessor {
    async fn confirm_card_payment(&self, client_secret: &str, _card: &CardDetails) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!client_secret.is_empty());
        if *self.decline.lock().unwrap() {
            return Err(Error::payment("Your card was declined."));
        }
        Ok(())
    }
}

pub fn test_card() -> CardDetails {
    CardDetails {
        number: "4242424242424242".to_string(),
        exp_month: 12,
        exp_year: 2030,
        cvc: "123".to_string(),
        holder_name: Some("Test Shopper".to_string()),
    }
}

pub struct Harness {
    pub client: Interiora,
    pub store: Arc<MemoryTokenStore>,
    pub navigator: Arc<RecordingNavigator>,
}

/// Client rooted at `<mock>/api/v1/` with a logged-in customer session.
pub fn harness(server: &MockServer) -> Harness {
    harness_with(server, Some(Session::new("access-1", "refresh-1", Some("CUSTOMER"))))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness_with(server: &MockServer, session: Option<Session>) -> Harness {
    init_tracing();
    let store = Arc::new(MemoryTokenStore::new());
    if let Some(session) = session {
        store.set(session).unwrap();
    }
    let navigator = Arc::new(RecordingNavigator::default());
    let config = InterioraConfig::new(
        &format!("{}/api/v1/", server.uri()),
        "ws://127.0.0.1:9/ws/notifications/",
    )
    .unwrap();
    let client = Interiora::new(config, store.clone(), navigator.clone()).unwrap();
    Harness {
        client,
        store,
        navigator,
    }
}
