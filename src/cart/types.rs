//! Cart types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Id,
    pub product: Id,
    /// Selected colour variant
    pub color: Id,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub color_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Stock of the selected variant, when the server reports it
    #[serde(default)]
    pub stock: Option<u32>,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn stepper(&self) -> QuantityStepper {
        QuantityStepper::new(self.quantity, self.stock)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn item(&self, id: Id) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Quantity control for one cart line.
///
/// Increments stop at the variant's stock (no cap when unknown); decrements
/// stop at 1. A line already above stock is left as it is: "+" does nothing
/// and "-" steps down one unit. Removing a line is a separate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityStepper {
    quantity: u32,
    stock: Option<u32>,
}

impl QuantityStepper {
    pub fn new(quantity: u32, stock: Option<u32>) -> Self {
        Self {
            quantity: quantity.max(1),
            stock,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn can_increment(&self) -> bool {
        self.stock.map_or(true, |stock| self.quantity < stock)
    }

    pub fn can_decrement(&self) -> bool {
        self.quantity > 1
    }

    pub fn increment(&mut self) -> u32 {
        if self.can_increment() {
            self.quantity += 1;
        }
        self.quantity
    }

    pub fn decrement(&mut self) -> u32 {
        if self.can_decrement() {
            self.quantity -= 1;
        }
        self.quantity
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewCartItem {
    pub product: Id,
    pub color: Id,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuantityUpdate {
    pub quantity: u32,
}
