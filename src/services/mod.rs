//! Service bookings: design, consultation, area estimation, supervision and
//! implementation all go through [`BookingForm`].

mod form;
mod types;

pub use form::BookingForm;
pub use types::*;

use chrono::NaiveDate;
use tracing::debug;

use crate::catalog::Id;
use crate::error::{Error, Result};
use crate::fetch::{ApiClient, RequestBody, RequestOptions};
use crate::pagination::Listing;

const AVAILABILITY: &str = "services/consultations/availability/";
const SETTINGS: &str = "services/settings/";

/// Services client
#[derive(Clone)]
pub struct ServicesClient {
    api: ApiClient,
}

impl ServicesClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Post a booking to the endpoint of `kind` and return the order id.
    pub async fn create(&self, kind: ServiceKind, body: RequestBody) -> Result<Id> {
        let options = match body {
            RequestBody::Multipart(form) => RequestOptions::post().multipart(form),
            RequestBody::Json(value) => RequestOptions::post().json(&value)?,
            RequestBody::Empty => RequestOptions::post(),
        };
        let response: BookingResponse = self.api.send_json(kind.endpoint(), options).await?;
        response.order_id().ok_or_else(|| {
            Error::Json(serde::de::Error::missing_field("order_id"))
        })
    }

    /// Open slots for a consultant on `date`, for a meeting of `duration_minutes`.
    pub async fn availability(
        &self,
        consultant: Id,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Result<Vec<TimeSlot>> {
        let options = RequestOptions::get()
            .query("consultant", consultant)
            .query("date", date.format("%Y-%m-%d"))
            .query("duration", duration_minutes);
        let listing: Listing<TimeSlot> = self.api.send_json(AVAILABILITY, options).await?;
        Ok(listing.into_vec())
    }

    pub async fn settings(&self) -> Result<ServiceSettings> {
        self.api.get_json(SETTINGS).await
    }

    pub async fn update_settings(&self, settings: &ServiceSettings) -> Result<ServiceSettings> {
        self.api.put_json(SETTINGS, settings).await
    }

    pub async fn consultants(&self) -> Result<Vec<Consultant>> {
        let listing: Listing<Consultant> = self.api.get_json("services/consultants/").await?;
        Ok(listing.into_vec())
    }

    pub async fn consultation_methods(&self) -> Result<Vec<ConsultationMethod>> {
        let listing: Listing<ConsultationMethod> =
            self.api.get_json("consultation-methods/").await?;
        Ok(listing.into_vec())
    }
}

/// Inputs of the consultation time-slot selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub consultant: Option<Id>,
    pub date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
}

impl AvailabilityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selector stays disabled until all three inputs are chosen.
    pub fn slots_enabled(&self) -> bool {
        self.consultant.is_some() && self.date.is_some() && self.duration_minutes.is_some()
    }

    pub async fn fetch_slots(&self, services: &ServicesClient) -> Result<Vec<TimeSlot>> {
        match (self.consultant, self.date, self.duration_minutes) {
            (Some(consultant), Some(date), Some(duration)) => {
                services.availability(consultant, date, duration).await
            }
            _ => {
                debug!(query = ?self, "slot selector disabled");
                let mut missing = Vec::new();
                if self.consultant.is_none() {
                    missing.push("consultant");
                }
                if self.date.is_none() {
                    missing.push("date");
                }
                if self.duration_minutes.is_none() {
                    missing.push("duration");
                }
                Err(Error::validation(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_needs_all_three_inputs() {
        let mut query = AvailabilityQuery::new();
        assert!(!query.slots_enabled());
        query.consultant = Some(2);
        query.date = NaiveDate::from_ymd_opt(2024, 5, 2);
        assert!(!query.slots_enabled());
        query.duration_minutes = Some(60);
        assert!(query.slots_enabled());
    }
}
