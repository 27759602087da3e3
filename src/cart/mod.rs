//! Shopping cart: the REST client, the browsing view and checkout.

mod checkout;
mod types;

pub use checkout::{CheckoutState, CheckoutWorkflow, ShippingInfo};
pub use types::{Cart, CartItem, QuantityStepper};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::catalog::Id;
use crate::error::{Error, Result};
use crate::fetch::ApiClient;
use types::{NewCartItem, QuantityUpdate};

/// Asks the user to confirm a destructive action (the delete modal).
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Cart client. Every mutation is an independent request.
#[derive(Clone)]
pub struct CartClient {
    api: ApiClient,
}

impl CartClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn cart(&self) -> Result<Cart> {
        self.api.get_json("cart/").await
    }

    pub async fn add_item(&self, product: Id, color: Id, quantity: u32) -> Result<CartItem> {
        if quantity == 0 {
            return Err(Error::validation(["quantity"]));
        }
        let body = NewCartItem {
            product,
            color,
            quantity,
        };
        self.api.post_json("cart/items/", &body).await
    }

    pub async fn update_item(&self, item: Id, quantity: u32) -> Result<()> {
        let path = format!("cart/items/{}/", item);
        let _: serde_json::Value = self
            .api
            .patch_json(&path, &QuantityUpdate { quantity })
            .await?;
        Ok(())
    }

    pub async fn delete_item(&self, item: Id) -> Result<()> {
        self.api.delete(&format!("cart/items/{}/", item)).await
    }
}

/// The cart page.
///
/// Holds the last fetched cart. Mutations go to the server first and the
/// whole cart is fetched again afterwards; nothing is patched locally.
pub struct CartView {
    client: CartClient,
    cart: Cart,
}

impl CartView {
    pub fn new(client: CartClient) -> Self {
        Self {
            client,
            cart: Cart::default(),
        }
    }

    /// Fetch the cart and build the view.
    pub async fn load(client: CartClient) -> Result<Self> {
        let mut view = Self::new(client);
        view.refresh().await?;
        Ok(view)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub async fn refresh(&mut self) -> Result<&Cart> {
        self.cart = self.client.cart().await?;
        Ok(&self.cart)
    }

    /// Checkout button and shipping form are only shown for a non-empty cart.
    pub fn can_checkout(&self) -> bool {
        !self.cart.is_empty()
    }

    fn line(&self, item: Id) -> Result<&CartItem> {
        self.cart
            .item(item)
            .ok_or_else(|| Error::validation([format!("cart item {}", item)]))
    }

    /// One more unit, up to the variant's stock. Returns the new quantity.
    pub async fn increment(&mut self, item: Id) -> Result<u32> {
        let mut stepper = self.line(item)?.stepper();
        let current = stepper.quantity();
        let next = stepper.increment();
        self.apply(item, current, next).await
    }

    /// One unit less, never below 1. Returns the new quantity.
    pub async fn decrement(&mut self, item: Id) -> Result<u32> {
        let mut stepper = self.line(item)?.stepper();
        let current = stepper.quantity();
        let next = stepper.decrement();
        self.apply(item, current, next).await
    }

    async fn apply(&mut self, item: Id, current: u32, next: u32) -> Result<u32> {
        if next == current {
            debug!(item, quantity = current, "quantity unchanged, nothing sent");
            return Ok(current);
        }
        self.client.update_item(item, next).await?;
        self.refresh().await?;
        Ok(next)
    }

    /// Delete a line after the user confirms. Returns whether it was deleted.
    pub async fn remove(&mut self, item: Id, prompt: &dyn ConfirmPrompt) -> Result<bool> {
        let name = self
            .line(item)?
            .product_name
            .clone()
            .unwrap_or_else(|| "this item".to_string());

        if !prompt.confirm(&format!("Remove {} from your cart?", name)).await {
            debug!(item, "removal dismissed");
            return Ok(false);
        }

        self.client.delete_item(item).await?;
        info!(item, "cart item removed");
        self.refresh().await?;
        Ok(true)
    }

    /// Drop the local copy once payment went through.
    pub fn clear(&mut self) {
        self.cart.items.clear();
    }
}
