//! REST surface of the back office.
//!
//! Access is decided by the server. [`AdminGate`](crate::routes::AdminGate)
//! only hides screens.

mod types;

pub use types::*;

use std::marker::PhantomData;

use tracing::info;

use crate::catalog::{Category, ColorVariant, Id, Product, Section};
use crate::error::Result;
use crate::fetch::{ApiClient, MultipartForm, RequestOptions};
use crate::orders::Complaint;
use crate::pagination::Listing;
use crate::services::ConsultationMethod;

/// List, read, create, update and delete one collection.
pub struct Resource<T> {
    api: ApiClient,
    path: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            path: self.path.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: AdminEntity> Resource<T> {
    pub fn new(api: ApiClient, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            api,
            path,
            _entity: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: Id) -> String {
        format!("{}{}/", self.path, id)
    }

    pub async fn list(&self) -> Result<Vec<T>> {
        let listing: Listing<T> = self.api.get_json(&self.path).await?;
        Ok(listing.into_vec())
    }

    pub async fn get(&self, id: Id) -> Result<T> {
        self.api.get_json(&self.item_path(id)).await
    }

    pub async fn create(&self, input: &T::Input) -> Result<T> {
        let created = self.api.post_json(&self.path, input).await?;
        info!(resource = %self.path, "created");
        Ok(created)
    }

    /// Create from a form carrying files, e.g. a design with its image.
    pub async fn create_multipart(&self, form: MultipartForm) -> Result<T> {
        let created = self
            .api
            .send_json(&self.path, RequestOptions::post().multipart(form))
            .await?;
        info!(resource = %self.path, "created");
        Ok(created)
    }

    /// Partial update with only the given fields.
    pub async fn update(&self, id: Id, changes: &serde_json::Value) -> Result<T> {
        self.api.patch_json(&self.item_path(id), changes).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.api.delete(&self.item_path(id)).await?;
        info!(resource = %self.path, id, "deleted");
        Ok(())
    }
}

/// Hands out the back-office resources.
#[derive(Clone)]
pub struct AdminClient {
    api: ApiClient,
}

impl AdminClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn resource<T: AdminEntity>(&self, path: &str) -> Resource<T> {
        Resource::new(self.api.clone(), path)
    }

    pub fn departments(&self) -> Resource<Department> {
        self.resource("departments/")
    }

    pub fn employees(&self) -> Resource<Employee> {
        self.resource("employees/")
    }

    pub fn plans(&self) -> Resource<Plan> {
        self.resource("plans/")
    }

    pub fn designs(&self) -> Resource<Design> {
        self.resource("designs/")
    }

    pub fn consultation_methods(&self) -> Resource<ConsultationMethod> {
        self.resource("consultation-methods/")
    }

    pub fn complaints(&self) -> Resource<Complaint> {
        self.resource("complaints/")
    }

    pub fn sections(&self) -> Resource<Section> {
        self.resource("sections/")
    }

    pub fn categories(&self) -> Resource<Category> {
        self.resource("categories/")
    }

    pub fn products(&self) -> Resource<Product> {
        self.resource("products/")
    }

    /// Colour variants of one product.
    pub fn color_variants(&self, product: Id) -> Resource<ColorVariant> {
        self.resource(&format!("products/{}/colors/", product))
    }
}
