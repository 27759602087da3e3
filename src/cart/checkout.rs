//! Checkout state machine.
//!
//! ```text
//! Browsing -> CollectingShippingInfo -> OrderCreated -> PaymentIntentRequested
//!   -> AwaitingProviderConfirmation -> Succeeded
//!                                   \-> Failed -> (pay again)
//!   PaymentIntentRequested -> Redirected   (redirect provider, terminal here)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

use super::CartView;
use crate::catalog::Id;
use crate::error::{Error, Result};
use crate::orders::OrdersClient;
use crate::payments::{
    CardDetails, PaymentConfirmation, PaymentIntent, PaymentOutcome, PaymentProvider,
};
use crate::routes::Destination;

/// Delivery details collected before the order is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl ShippingInfo {
    /// Names of blank fields. Formats are not checked.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Browsing,
    CollectingShippingInfo,
    OrderCreated {
        order_id: Id,
    },
    PaymentIntentRequested {
        order_id: Id,
        provider: PaymentProvider,
    },
    AwaitingProviderConfirmation {
        order_id: Id,
        provider: PaymentProvider,
    },
    /// The app navigated to the provider; confirmation happens on return.
    Redirected {
        order_id: Id,
        approval_url: Url,
    },
    Succeeded {
        order_id: Id,
    },
    /// The order is still payable; pick a provider and pay again.
    Failed {
        order_id: Id,
        message: String,
    },
}

impl CheckoutState {
    pub fn order_id(&self) -> Option<Id> {
        match self {
            CheckoutState::Browsing | CheckoutState::CollectingShippingInfo => None,
            CheckoutState::OrderCreated { order_id }
            | CheckoutState::PaymentIntentRequested { order_id, .. }
            | CheckoutState::AwaitingProviderConfirmation { order_id, .. }
            | CheckoutState::Redirected { order_id, .. }
            | CheckoutState::Succeeded { order_id }
            | CheckoutState::Failed { order_id, .. } => Some(*order_id),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Succeeded { .. } | CheckoutState::Redirected { .. }
        )
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Browsing => "browsing",
            CheckoutState::CollectingShippingInfo => "collecting shipping info",
            CheckoutState::OrderCreated { .. } => "order created",
            CheckoutState::PaymentIntentRequested { .. } => "payment intent requested",
            CheckoutState::AwaitingProviderConfirmation { .. } => "awaiting provider confirmation",
            CheckoutState::Redirected { .. } => "redirected",
            CheckoutState::Succeeded { .. } => "succeeded",
            CheckoutState::Failed { .. } => "failed",
        };
        f.write_str(name)
    }
}

/// Drives one customer from the cart page to a paid order.
pub struct CheckoutWorkflow {
    cart: CartView,
    orders: OrdersClient,
    confirmation: PaymentConfirmation,
    state: CheckoutState,
    shipping: ShippingInfo,
}

impl CheckoutWorkflow {
    pub fn new(cart: CartView, orders: OrdersClient, confirmation: PaymentConfirmation) -> Self {
        Self {
            cart,
            orders,
            confirmation,
            state: CheckoutState::Browsing,
            shipping: ShippingInfo::default(),
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn cart(&self) -> &CartView {
        &self.cart
    }

    /// Quantity changes and removals while browsing.
    pub fn cart_mut(&mut self) -> &mut CartView {
        &mut self.cart
    }

    pub fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    pub fn shipping_mut(&mut self) -> &mut ShippingInfo {
        &mut self.shipping
    }

    /// Inline error of the last failed payment attempt.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            CheckoutState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the shipping form is shown.
    pub fn shows_shipping_form(&self) -> bool {
        self.state == CheckoutState::CollectingShippingInfo && self.cart.can_checkout()
    }

    fn transition(&mut self, next: CheckoutState) {
        debug!(from = %self.state, to = %next, "checkout transition");
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            from: self.state.to_string(),
            action,
        }
    }

    /// Leave the cart page for the shipping form.
    pub fn begin(&mut self) -> Result<()> {
        if self.state != CheckoutState::Browsing {
            return Err(self.invalid("begin checkout"));
        }
        if !self.cart.can_checkout() {
            return Err(Error::EmptyCart);
        }
        self.transition(CheckoutState::CollectingShippingInfo);
        Ok(())
    }

    /// Back from the shipping form to the cart page. Entered values are kept.
    pub fn back_to_cart(&mut self) -> Result<()> {
        if self.state != CheckoutState::CollectingShippingInfo {
            return Err(self.invalid("return to cart"));
        }
        self.transition(CheckoutState::Browsing);
        Ok(())
    }

    /// Create the order. Blank fields fail before anything is sent.
    pub async fn submit_shipping(&mut self) -> Result<Id> {
        if self.state != CheckoutState::CollectingShippingInfo {
            return Err(self.invalid("submit shipping info"));
        }
        let missing = self.shipping.missing_fields();
        if !missing.is_empty() {
            return Err(Error::validation(missing));
        }

        let order = self.orders.create(&self.shipping).await?;
        info!(order_id = order.id, "order created");
        self.transition(CheckoutState::OrderCreated { order_id: order.id });
        Ok(order.id)
    }

    /// Pay for the created order.
    ///
    /// Payment errors do not come back as `Err`: they leave the machine in
    /// [`CheckoutState::Failed`] with the message to show, and the order can
    /// be paid again with any provider. `Err` means the call itself was out
    /// of place.
    pub async fn pay(
        &mut self,
        provider: PaymentProvider,
        card: Option<&CardDetails>,
    ) -> Result<&CheckoutState> {
        let order_id = match &self.state {
            CheckoutState::OrderCreated { order_id } | CheckoutState::Failed { order_id, .. } => {
                *order_id
            }
            _ => return Err(self.invalid("pay")),
        };

        if provider.requires_card_input() && card.is_none() {
            return Err(Error::validation(["card"]));
        }

        self.transition(CheckoutState::PaymentIntentRequested { order_id, provider });
        let outcome = match self.confirmation.request_intent(order_id, provider).await {
            Ok(intent) => {
                if matches!(intent, PaymentIntent::Card { .. }) {
                    self.transition(CheckoutState::AwaitingProviderConfirmation { order_id, provider });
                }
                self.confirmation.finish(order_id, intent, card).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(PaymentOutcome::Redirected(approval_url)) => {
                self.transition(CheckoutState::Redirected {
                    order_id,
                    approval_url,
                });
            }
            Ok(PaymentOutcome::Succeeded) => {
                self.cart.clear();
                self.confirmation.navigator().navigate(Destination::Home);
                self.transition(CheckoutState::Succeeded { order_id });
            }
            Err(e) => {
                warn!(order_id, error = %e, "payment failed");
                self.transition(CheckoutState::Failed {
                    order_id,
                    message: e.user_message(),
                });
            }
        }

        Ok(&self.state)
    }
}
