//! Back-office entities and the payloads that create them.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, ColorVariant, Id, Product, Section};
use crate::orders::Complaint;
use crate::services::ConsultationMethod;

/// A row managed through a [`Resource`](super::Resource).
pub trait AdminEntity: DeserializeOwned + Send + Sync {
    /// Body of a create call.
    type Input: Serialize + Send + Sync;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Id,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Id>,
}

/// Subscription plan offered on the services page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Id,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPlan {
    pub name: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Catalogue design. Created with an image, so usually via multipart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Design {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewDesign {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewConsultationMethod {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewComplaint {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSection {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub section: Id,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: Id,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewColorVariant {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_code: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
}

macro_rules! admin_entity {
    ($($entity:ty => $input:ty),* $(,)?) => {
        $(impl AdminEntity for $entity {
            type Input = $input;
        })*
    };
}

admin_entity! {
    Department => NewDepartment,
    Employee => NewEmployee,
    Plan => NewPlan,
    Design => NewDesign,
    ConsultationMethod => NewConsultationMethod,
    Complaint => NewComplaint,
    Section => NewSection,
    Category => NewCategory,
    Product => NewProduct,
    ColorVariant => NewColorVariant,
}
