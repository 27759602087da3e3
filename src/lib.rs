//! Interiora Rust Client Library
//!
//! A Rust client for the Interiora interior-design storefront: catalog,
//! cart and checkout, service bookings, orders, complaints, notifications
//! and the back-office REST surface.
//!
//! Every call goes through one [`fetch::ApiClient`], which attaches the
//! stored access token and refreshes it once when the server answers 401.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod notifications;
pub mod orders;
pub mod pagination;
pub mod payments;
pub mod routes;
pub mod services;

pub use interiora_auth as auth;
pub use interiora_realtime as realtime;

use std::sync::Arc;

use interiora_auth::{AuthClient, FileTokenStore, MemoryTokenStore, Session, TokenStore};
use interiora_realtime::NotificationSocket;
use reqwest::Client;
use tracing::info;

use crate::admin::AdminClient;
use crate::cart::{CartClient, CartView, CheckoutWorkflow};
use crate::catalog::CatalogClient;
use crate::config::InterioraConfig;
use crate::error::{Error, Result};
use crate::fetch::ApiClient;
use crate::notifications::NotificationFeed;
use crate::orders::{ComplaintsClient, OrdersClient};
use crate::payments::{CardProcessor, PaymentConfirmation, PaymentsClient};
use crate::routes::{landing_for, Destination, LogNavigator, Navigator};
use crate::services::ServicesClient;

/// The main entry point for the Interiora client
pub struct Interiora {
    config: InterioraConfig,
    auth: Arc<AuthClient>,
    api: ApiClient,
}

impl Interiora {
    /// Create a new client around an explicit token store and navigator.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use interiora::auth::MemoryTokenStore;
    /// use interiora::config::InterioraConfig;
    /// use interiora::routes::LogNavigator;
    /// use interiora::Interiora;
    ///
    /// let config = InterioraConfig::new(
    ///     "https://api.example.com/api/v1/",
    ///     "wss://api.example.com/ws/notifications/",
    /// ).unwrap();
    /// let client = Interiora::new(
    ///     config,
    ///     Arc::new(MemoryTokenStore::new()),
    ///     Arc::new(LogNavigator),
    /// ).unwrap();
    /// assert!(client.session().is_none());
    /// ```
    pub fn new(
        config: InterioraConfig,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Arc::new(AuthClient::new(
            config.api_url.as_str(),
            http_client.clone(),
            store,
        ));
        let api = ApiClient::new(&config.api_url, http_client, auth.clone(), navigator);

        Ok(Self { config, auth, api })
    }

    /// Build from `INTERIORA_*` variables with a file-backed session when a
    /// session path is configured, in memory otherwise.
    pub fn from_env() -> Result<Self> {
        let config = InterioraConfig::from_env()?;
        let store: Arc<dyn TokenStore> = match (&config.options.session_path, config.options.persist_session) {
            (Some(path), true) => Arc::new(FileTokenStore::new(path.clone())),
            _ => Arc::new(MemoryTokenStore::new()),
        };
        Self::new(config, store, Arc::new(LogNavigator))
    }

    pub fn config(&self) -> &InterioraConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Option<Session> {
        self.auth.session()
    }

    /// Log in, then navigate to the landing page for the session's role.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.login(email, password).await?;
        let destination = landing_for(&session);
        info!(path = destination.path(), "logged in");
        self.api.navigator().navigate(destination);
        Ok(session)
    }

    /// Forget the session and go back to the login page.
    pub fn logout(&self) {
        self.auth.logout();
        self.api.navigator().navigate(Destination::Login);
    }

    pub fn catalog(&self) -> CatalogClient {
        CatalogClient::new(self.api.clone())
    }

    pub fn cart(&self) -> CartClient {
        CartClient::new(self.api.clone())
    }

    pub fn orders(&self) -> OrdersClient {
        OrdersClient::new(self.api.clone())
    }

    pub fn complaints(&self) -> ComplaintsClient {
        ComplaintsClient::new(self.api.clone())
    }

    pub fn payments(&self) -> PaymentsClient {
        PaymentsClient::new(self.api.clone())
    }

    /// The confirmation step used by checkout and bookings. Card payments
    /// need `card_processor`; redirect payments work without one.
    pub fn payment_confirmation(
        &self,
        card_processor: Option<Arc<dyn CardProcessor>>,
    ) -> PaymentConfirmation {
        PaymentConfirmation::new(self.payments(), card_processor, self.api.navigator().clone())
    }

    /// Fetch the cart and start a checkout from it.
    pub async fn checkout(
        &self,
        card_processor: Option<Arc<dyn CardProcessor>>,
    ) -> Result<CheckoutWorkflow> {
        let view = CartView::load(self.cart()).await?;
        Ok(CheckoutWorkflow::new(
            view,
            self.orders(),
            self.payment_confirmation(card_processor),
        ))
    }

    pub fn services(&self) -> ServicesClient {
        ServicesClient::new(self.api.clone())
    }

    pub fn notifications(&self) -> NotificationFeed {
        NotificationFeed::new(self.api.clone(), self.config.options.notifications_page_size)
    }

    /// A fresh socket for the unread badge. Connect it with the current
    /// access token.
    pub fn notification_socket(&self) -> NotificationSocket {
        NotificationSocket::new(self.config.socket_url.as_str())
    }

    /// Connect a notification socket with the stored access token.
    pub async fn connect_notifications(&self) -> Result<NotificationSocket> {
        let token = self
            .auth
            .store()
            .access_token()
            .ok_or(Error::Auth(interiora_auth::AuthError::MissingSession))?;
        let socket = self.notification_socket();
        socket.connect(&token).await?;
        Ok(socket)
    }

    pub fn admin(&self) -> AdminClient {
        AdminClient::new(self.api.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{MemoryTokenStore, Session, TokenStore};
    pub use crate::cart::{CheckoutState, CheckoutWorkflow, ShippingInfo};
    pub use crate::config::{ClientOptions, InterioraConfig};
    pub use crate::error::{Error, Result};
    pub use crate::payments::{CardDetails, CardProcessor, PaymentProvider};
    pub use crate::routes::{Destination, Navigator};
    pub use crate::services::{BookingForm, ServiceKind};
    pub use crate::Interiora;
}
