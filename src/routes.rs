//! Navigation targets and the admin role gate.

use interiora_auth::{Session, TokenStore};
use url::Url;

/// Where the client asks the embedding application to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Login,
    Home,
    AdminOverview,
    Cart,
    Orders,
    /// Leave the application, e.g. for a hosted payment page.
    External(Url),
}

impl Destination {
    pub fn path(&self) -> &str {
        match self {
            Destination::Login => "/login",
            Destination::Home => "/home",
            Destination::AdminOverview => "/admin/overview",
            Destination::Cart => "/home/cart",
            Destination::Orders => "/home/orders",
            Destination::External(url) => url.as_str(),
        }
    }
}

/// Seam for route changes. The library never renders anything itself.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

/// Default navigator: records the request as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, destination: Destination) {
        tracing::info!(path = destination.path(), "navigate");
    }
}

/// Landing page after login.
pub fn landing_for(session: &Session) -> Destination {
    if session.is_admin() {
        Destination::AdminOverview
    } else {
        Destination::Home
    }
}

/// Client-side gate for the admin route tree.
///
/// This only hides screens. The server authorizes every admin call on its
/// own; a tampered store gets past this check and nothing more.
pub struct AdminGate;

impl AdminGate {
    pub fn allows(store: &dyn TokenStore) -> bool {
        store.get().map(|s| s.is_admin()).unwrap_or(false)
    }
}
