//! The booking form every service shares.

use std::collections::BTreeMap;

use tracing::info;

use super::types::{FieldKind, FieldValue, ServiceKind};
use super::ServicesClient;
use crate::catalog::Id;
use crate::error::{Error, Result};
use crate::fetch::{FilePart, MultipartForm, RequestBody};
use crate::payments::{CardDetails, PaymentConfirmation, PaymentOutcome, PaymentProvider};

/// Collects the fields of one [`ServiceKind`], creates the booking and pays
/// for it through the shared [`PaymentConfirmation`].
#[derive(Debug, Clone)]
pub struct BookingForm {
    kind: ServiceKind,
    values: BTreeMap<&'static str, FieldValue>,
    files: BTreeMap<&'static str, FilePart>,
    order_id: Option<Id>,
}

impl BookingForm {
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
            files: BTreeMap::new(),
            order_id: None,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Order created by [`submit`](Self::submit), if it ran.
    pub fn order_id(&self) -> Option<Id> {
        self.order_id
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Fill a field. Unknown names and values of the wrong kind are refused.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<&mut Self> {
        let value = value.into();
        let spec = self
            .kind
            .field(name)
            .filter(|spec| spec.kind == value.kind())
            .ok_or_else(|| Error::validation([name]))?;
        self.values.insert(spec.name, value);
        Ok(self)
    }

    pub fn clear(&mut self, name: &str) {
        self.values.remove(name);
        self.files.remove(name);
    }

    pub fn attach(&mut self, name: &str, file: FilePart) -> Result<&mut Self> {
        let spec = self
            .kind
            .field(name)
            .filter(|spec| spec.kind == FieldKind::File)
            .ok_or_else(|| Error::validation([name]))?;
        self.files.insert(spec.name, file);
        Ok(self)
    }

    /// Required fields that are still empty, in schema order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.kind
            .schema()
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| match spec.kind {
                FieldKind::File => !self.files.contains_key(spec.name),
                _ => self.values.get(spec.name).map_or(true, FieldValue::is_blank),
            })
            .map(|spec| spec.name)
            .collect()
    }

    fn body(&self) -> RequestBody {
        if self.files.is_empty() {
            let object = self
                .values
                .iter()
                .filter(|(_, value)| !value.is_blank())
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect::<serde_json::Map<_, _>>();
            return RequestBody::Json(serde_json::Value::Object(object));
        }

        let mut form = MultipartForm::new();
        for (name, value) in self.values.iter().filter(|(_, value)| !value.is_blank()) {
            form = form.text(name, value.to_string());
        }
        for (name, file) in &self.files {
            form = form.file(name, file.clone());
        }
        RequestBody::Multipart(form)
    }

    /// Create the booking. Returns the id of the order to pay.
    pub async fn submit(&mut self, services: &ServicesClient) -> Result<Id> {
        if self.order_id.is_some() {
            return Err(Error::InvalidTransition {
                from: "submitted".to_string(),
                action: "submit booking",
            });
        }
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::validation(missing));
        }

        let order_id = services.create(self.kind, self.body()).await?;
        info!(service = %self.kind, order_id, "booking created");
        self.order_id = Some(order_id);
        Ok(order_id)
    }

    /// Pay for the submitted booking. Can be called again after a failure.
    pub async fn pay(
        &self,
        confirmation: &PaymentConfirmation,
        provider: PaymentProvider,
        card: Option<&CardDetails>,
    ) -> Result<PaymentOutcome> {
        let order_id = self.order_id.ok_or_else(|| Error::InvalidTransition {
            from: "not submitted".to_string(),
            action: "pay",
        })?;
        confirmation.confirm(order_id, provider, card).await
    }
}
