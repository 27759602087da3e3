//! Catalog types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type Id = i64;

/// Top-level grouping of the storefront (e.g. "Living room").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub name: String,
    pub section: Id,
    #[serde(default)]
    pub image: Option<String>,
}

/// Per-colour SKU carrying its own price, stock and optional image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub id: Id,
    pub color: String,
    #[serde(default)]
    pub hex_code: Option<String>,
    pub price: Decimal,
    /// Units in stock
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl ColorVariant {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Id,
    #[serde(default)]
    pub colors: Vec<ColorVariant>,
    #[serde(default)]
    pub average_rating: Option<f32>,
}

impl Product {
    pub fn color(&self, color_id: Id) -> Option<&ColorVariant> {
        self.colors.iter().find(|c| c.id == color_id)
    }

    /// Cheapest variant price, used for "from" labels.
    pub fn starting_price(&self) -> Option<Decimal> {
        self.colors.iter().map(|c| c.price).min()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Id,
    pub product: Id,
    pub score: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewRating<'a> {
    pub product: Id,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}
