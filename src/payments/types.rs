//! Payment types

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::catalog::Id;
use crate::error::{Error, Result};

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentProvider {
    /// Card processor; confirmed in-app with a client secret.
    #[serde(rename = "stripe")]
    Card,
    /// Hosted approval page; the browser leaves the app.
    #[serde(rename = "paypal")]
    Redirect,
}

impl PaymentProvider {
    /// Only card payments show the card input.
    pub fn requires_card_input(&self) -> bool {
        matches!(self, PaymentProvider::Card)
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentProvider::Card => write!(f, "card"),
            PaymentProvider::Redirect => write!(f, "redirect"),
        }
    }
}

/// Server-issued handle for one payment attempt. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentIntent {
    Card { client_secret: String },
    Redirect { approval_url: Url },
}

#[derive(Debug, Deserialize)]
pub(crate) struct IntentResponse {
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub approval_url: Option<String>,
}

impl PaymentIntent {
    pub(crate) fn from_response(provider: PaymentProvider, response: IntentResponse) -> Result<Self> {
        match provider {
            PaymentProvider::Card => response
                .client_secret
                .map(|client_secret| PaymentIntent::Card { client_secret })
                .ok_or_else(|| Error::payment("payment intent is missing a client secret")),
            PaymentProvider::Redirect => {
                let raw = response
                    .approval_url
                    .ok_or_else(|| Error::payment("payment intent is missing an approval URL"))?;
                Ok(PaymentIntent::Redirect {
                    approval_url: Url::parse(&raw)?,
                })
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct IntentRequest {
    pub order_id: Id,
    pub payment_method: PaymentProvider,
}

/// Card fields handed to the card processor.
#[derive(Clone)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
    pub holder_name: Option<String>,
}

impl CardDetails {
    pub fn last4(&self) -> &str {
        let digits = self.number.trim();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or("")
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("**** {}", self.last4()))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"***")
            .finish()
    }
}

/// Query parameters the redirect provider appends when sending the
/// customer back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectReturn {
    pub payment_id: String,
    pub payer_id: String,
    pub order_id: Id,
}

impl RedirectReturn {
    pub fn from_url(url: &Url) -> Result<Self> {
        let mut payment_id = None;
        let mut payer_id = None;
        let mut order_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "paymentId" => payment_id = Some(value.into_owned()),
                "PayerID" => payer_id = Some(value.into_owned()),
                "order_id" => order_id = value.parse::<Id>().ok(),
                _ => {}
            }
        }

        match (payment_id, payer_id, order_id) {
            (Some(payment_id), Some(payer_id), Some(order_id)) => Ok(Self {
                payment_id,
                payer_id,
                order_id,
            }),
            (payment_id, payer_id, order_id) => {
                let mut missing = Vec::new();
                if payment_id.is_none() {
                    missing.push("paymentId");
                }
                if payer_id.is_none() {
                    missing.push("PayerID");
                }
                if order_id.is_none() {
                    missing.push("order_id");
                }
                Err(Error::validation(missing))
            }
        }
    }

    pub(crate) fn query(&self) -> [(&'static str, String); 3] {
        [
            ("paymentId", self.payment_id.clone()),
            ("PayerID", self.payer_id.clone()),
            ("order_id", self.order_id.to_string()),
        ]
    }
}

/// How a confirmation attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    /// The app navigated away; the provider confirms out of band.
    Redirected(Url),
}
