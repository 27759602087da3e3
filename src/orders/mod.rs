//! Orders and complaints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::ShippingInfo;
use crate::catalog::Id;
use crate::error::{Error, Result};
use crate::fetch::ApiClient;
use crate::pagination::Listing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: Id,
    #[serde(default)]
    pub color: Option<Id>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Server-side order. Checkout only keeps the id; history screens read the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Id,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct OrdersClient {
    api: ApiClient,
}

impl OrdersClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Turn the current cart into an order shipped to `shipping`.
    pub async fn create(&self, shipping: &ShippingInfo) -> Result<Order> {
        self.api.post_json("orders/", shipping).await
    }

    pub async fn history(&self) -> Result<Vec<Order>> {
        let listing: Listing<Order> = self.api.get_json("orders/").await?;
        Ok(listing.into_vec())
    }

    pub async fn order(&self, id: Id) -> Result<Order> {
        self.api.get_json(&format!("orders/{}/", id)).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Id,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ComplaintsClient {
    api: ApiClient,
}

impl ComplaintsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn submit(&self, subject: &str, message: &str) -> Result<Complaint> {
        let mut missing = Vec::new();
        if subject.trim().is_empty() {
            missing.push("subject");
        }
        if message.trim().is_empty() {
            missing.push("message");
        }
        if !missing.is_empty() {
            return Err(Error::validation(missing));
        }

        let body = serde_json::json!({ "subject": subject.trim(), "message": message.trim() });
        self.api.post_json("complaints/", &body).await
    }

    /// Complaints filed by the logged-in customer.
    pub async fn mine(&self) -> Result<Vec<Complaint>> {
        let listing: Listing<Complaint> = self.api.get_json("complaints/").await?;
        Ok(listing.into_vec())
    }
}
