//! Payment intents, the card-processor seam and the shared confirmation step.

mod types;

pub use types::{CardDetails, PaymentIntent, PaymentOutcome, PaymentProvider, RedirectReturn};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::Id;
use crate::error::{Error, Result};
use crate::fetch::{ApiClient, RequestOptions};
use crate::routes::{Destination, Navigator};
use types::{IntentRequest, IntentResponse};

/// The card payment SDK.
///
/// Implementations submit card fields against the client secret of a card
/// intent. A decline must come back as [`Error::Payment`].
#[async_trait]
pub trait CardProcessor: Send + Sync {
    async fn confirm_card_payment(&self, client_secret: &str, card: &CardDetails) -> Result<()>;
}

/// Payments client
#[derive(Clone)]
pub struct PaymentsClient {
    api: ApiClient,
}

impl PaymentsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_intent(&self, order_id: Id, provider: PaymentProvider) -> Result<PaymentIntent> {
        let body = IntentRequest {
            order_id,
            payment_method: provider,
        };
        let response: IntentResponse = self.api.post_json("payments/create-intent/", &body).await?;
        PaymentIntent::from_response(provider, response)
    }

    /// Tell the server the customer came back from the redirect provider.
    pub async fn complete_redirect(&self, ret: &RedirectReturn) -> Result<serde_json::Value> {
        let mut options = RequestOptions::get();
        for (key, value) in ret.query() {
            options = options.query(key, value);
        }
        self.api.send_json("payments/paypal/success/", options).await
    }

    pub async fn refund(&self, order_id: Id) -> Result<serde_json::Value> {
        self.api
            .post_json("payments/refund/", &serde_json::json!({ "order_id": order_id }))
            .await
    }
}

/// Confirmation step shared by checkout and every service booking.
#[derive(Clone)]
pub struct PaymentConfirmation {
    payments: PaymentsClient,
    card_processor: Option<Arc<dyn CardProcessor>>,
    navigator: Arc<dyn Navigator>,
}

impl PaymentConfirmation {
    pub fn new(
        payments: PaymentsClient,
        card_processor: Option<Arc<dyn CardProcessor>>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            payments,
            card_processor,
            navigator,
        }
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Pay for `order_id` with `provider`.
    ///
    /// Redirect payments navigate away as soon as the approval URL is known
    /// and never reach the card processor. Card payments need `card`.
    pub async fn confirm(
        &self,
        order_id: Id,
        provider: PaymentProvider,
        card: Option<&CardDetails>,
    ) -> Result<PaymentOutcome> {
        if provider.requires_card_input() && card.is_none() {
            return Err(Error::validation(["card"]));
        }
        let intent = self.request_intent(order_id, provider).await?;
        self.finish(order_id, intent, card).await
    }

    pub async fn request_intent(&self, order_id: Id, provider: PaymentProvider) -> Result<PaymentIntent> {
        self.payments.create_intent(order_id, provider).await
    }

    /// Second half of [`confirm`](Self::confirm), once the intent exists.
    pub async fn finish(
        &self,
        order_id: Id,
        intent: PaymentIntent,
        card: Option<&CardDetails>,
    ) -> Result<PaymentOutcome> {
        match intent {
            PaymentIntent::Redirect { approval_url } => {
                info!(order_id, "redirecting to payment provider");
                self.navigator
                    .navigate(Destination::External(approval_url.clone()));
                Ok(PaymentOutcome::Redirected(approval_url))
            }
            PaymentIntent::Card { client_secret } => {
                let processor = self
                    .card_processor
                    .as_ref()
                    .ok_or_else(|| Error::config("no card processor configured"))?;
                let card = card.ok_or_else(|| Error::validation(["card"]))?;
                if let Err(e) = processor.confirm_card_payment(&client_secret, card).await {
                    warn!(order_id, error = %e, "card confirmation failed");
                    return Err(e);
                }
                info!(order_id, "card payment confirmed");
                Ok(PaymentOutcome::Succeeded)
            }
        }
    }
}
