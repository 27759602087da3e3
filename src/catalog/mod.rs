//! Read access to sections, categories, products and ratings.

mod types;

pub use types::*;

use crate::error::{Error, Result};
use crate::fetch::{ApiClient, RequestOptions};
use crate::pagination::Listing;

/// Catalog client
#[derive(Clone)]
pub struct CatalogClient {
    api: ApiClient,
}

impl CatalogClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn sections(&self) -> Result<Vec<Section>> {
        let listing: Listing<Section> = self.api.get_json("sections/").await?;
        Ok(listing.into_vec())
    }

    /// Categories, optionally narrowed to one section.
    pub async fn categories(&self, section: Option<Id>) -> Result<Vec<Category>> {
        let mut options = RequestOptions::get();
        if let Some(section) = section {
            options = options.query("section", section);
        }
        let listing: Listing<Category> = self.api.send_json("categories/", options).await?;
        Ok(listing.into_vec())
    }

    pub async fn products(&self, category: Option<Id>) -> Result<Vec<Product>> {
        let mut options = RequestOptions::get();
        if let Some(category) = category {
            options = options.query("category", category);
        }
        let listing: Listing<Product> = self.api.send_json("products/", options).await?;
        Ok(listing.into_vec())
    }

    pub async fn product(&self, id: Id) -> Result<Product> {
        self.api.get_json(&format!("products/{}/", id)).await
    }

    pub async fn color_variants(&self, product: Id) -> Result<Vec<ColorVariant>> {
        let listing: Listing<ColorVariant> = self
            .api
            .get_json(&format!("products/{}/colors/", product))
            .await?;
        Ok(listing.into_vec())
    }

    pub async fn ratings(&self, product: Id) -> Result<Vec<Rating>> {
        let options = RequestOptions::get().query("product", product);
        let listing: Listing<Rating> = self.api.send_json("ratings/", options).await?;
        Ok(listing.into_vec())
    }

    /// Rate a product from 1 to 5.
    pub async fn rate(&self, product: Id, score: u8, comment: Option<&str>) -> Result<Rating> {
        if !(1..=5).contains(&score) {
            return Err(Error::validation(["score"]));
        }
        let body = NewRating {
            product,
            score,
            comment,
        };
        self.api.post_json("ratings/", &body).await
    }
}
