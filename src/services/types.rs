//! Service kinds, their field schemas and the settings behind cost previews.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Time,
    /// Id picked from a server-provided list.
    Choice,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

pub type FieldSchema = &'static [FieldSpec];

const DESIGN_FIELDS: &[FieldSpec] = &[
    required("design", FieldKind::Choice),
    required("area", FieldKind::Number),
    optional("notes", FieldKind::Text),
];

const CONSULTATION_FIELDS: &[FieldSpec] = &[
    required("consultant", FieldKind::Choice),
    required("consultation_method", FieldKind::Choice),
    required("date", FieldKind::Date),
    required("time", FieldKind::Time),
    required("duration", FieldKind::Number),
    optional("notes", FieldKind::Text),
];

const AREA_ESTIMATION_FIELDS: &[FieldSpec] = &[
    required("address", FieldKind::Text),
    required("area", FieldKind::Number),
    required("date", FieldKind::Date),
    optional("floor_plan", FieldKind::File),
];

const SUPERVISION_FIELDS: &[FieldSpec] = &[
    required("address", FieldKind::Text),
    required("start_date", FieldKind::Date),
    required("end_date", FieldKind::Date),
    optional("notes", FieldKind::Text),
];

const IMPLEMENTATION_FIELDS: &[FieldSpec] = &[
    required("address", FieldKind::Text),
    required("area", FieldKind::Number),
    required("start_date", FieldKind::Date),
    required("design_file", FieldKind::File),
    optional("notes", FieldKind::Text),
];

/// The bookable services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Design,
    Consultation,
    AreaEstimation,
    Supervision,
    Implementation,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Design,
        ServiceKind::Consultation,
        ServiceKind::AreaEstimation,
        ServiceKind::Supervision,
        ServiceKind::Implementation,
    ];

    /// Creation endpoint, relative to the API root.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ServiceKind::Design => "services/designs/",
            ServiceKind::Consultation => "services/consultations/",
            ServiceKind::AreaEstimation => "services/area-estimations/",
            ServiceKind::Supervision => "services/supervisions/",
            ServiceKind::Implementation => "services/implementations/",
        }
    }

    pub fn schema(&self) -> FieldSchema {
        match self {
            ServiceKind::Design => DESIGN_FIELDS,
            ServiceKind::Consultation => CONSULTATION_FIELDS,
            ServiceKind::AreaEstimation => AREA_ESTIMATION_FIELDS,
            ServiceKind::Supervision => SUPERVISION_FIELDS,
            ServiceKind::Implementation => IMPLEMENTATION_FIELDS,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.schema().iter().find(|spec| spec.name == name)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Design => "design",
            ServiceKind::Consultation => "consultation",
            ServiceKind::AreaEstimation => "area estimation",
            ServiceKind::Supervision => "supervision",
            ServiceKind::Implementation => "implementation",
        };
        f.write_str(name)
    }
}

/// A value entered into a booking field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Choice(Id),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Time(_) => FieldKind::Time,
            FieldValue::Choice(_) => FieldKind::Choice,
        }
    }

    /// Blank text counts as not filled in.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.trim().is_empty())
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(text) => serde_json::Value::String(text.trim().to_string()),
            FieldValue::Number(number) => serde_json::Value::String(number.to_string()),
            FieldValue::Date(_) | FieldValue::Time(_) => serde_json::Value::String(self.to_string()),
            FieldValue::Choice(id) => serde_json::Value::from(*id),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text.trim()),
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            FieldValue::Time(time) => write!(f, "{}", time.format("%H:%M")),
            FieldValue::Choice(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(value: NaiveTime) -> Self {
        FieldValue::Time(value)
    }
}

/// Bookable slot returned by the availability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultant {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationMethod {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Pricing knobs edited from the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub hourly_rate: Decimal,
    pub area_unit_cost: Decimal,
}

impl ServiceSettings {
    /// Price of a consultation lasting `minutes`, rounded to cents. `None`
    /// when the product does not fit in a `Decimal`.
    pub fn consultation_cost(&self, minutes: u32) -> Option<Decimal> {
        let cost = self.hourly_rate.checked_mul(Decimal::from(minutes))? / Decimal::from(60);
        Some(cost.round_dp(2))
    }

    pub fn area_cost(&self, square_metres: Decimal) -> Option<Decimal> {
        Some(self.area_unit_cost.checked_mul(square_metres)?.round_dp(2))
    }
}

/// Creation endpoints answer with the new order, under either key.
#[derive(Debug, Deserialize)]
pub(crate) struct BookingResponse {
    #[serde(default)]
    pub order_id: Option<Id>,
    #[serde(default)]
    pub id: Option<Id>,
}

impl BookingResponse {
    pub fn order_id(&self) -> Option<Id> {
        self.order_id.or(self.id)
    }
}
