//! Wire schema of an interval-usage feed.
//!
//! Every field is optional at decode time so structural gaps surface as
//! [`AppError::MissingData`] from validation instead of a decode failure.
//! Type mismatches and malformed JSON are [`AppError::Parsing`].

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feed {
    pub id: Option<String>,
    pub title: Option<String>,
    pub entries: Option<Vec<Entry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub reading_type: Option<ReadingTypeDescriptor>,
    pub interval_block: Option<Vec<RawIntervalReading>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingTypeDescriptor {
    pub flow_direction: Option<i32>,
    /// Accepts a decimal string (`"0.10"`) or a JSON number.
    #[serde(rename = "kWhPrice")]
    pub kwh_price: Option<Decimal>,
    pub reading_unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIntervalReading {
    pub value: Option<i64>,
    pub time_period: Option<TimePeriod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimePeriod {
    /// Epoch seconds, UTC.
    pub start: Option<i64>,
    /// Seconds.
    pub duration: Option<i64>,
}

/// Decode a raw feed document. A literal `null` document decodes to `None`.
pub fn parse_feed(raw: &[u8]) -> Result<Option<Feed>> {
    Ok(serde_json::from_slice(raw)?)
}
