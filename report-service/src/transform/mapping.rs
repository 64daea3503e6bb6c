use meter_client::domain::{NewIntervalReading, NewReadingType};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use super::units::normalize_to_kwh;
use super::validate::ValidatedFeed;
use crate::error::{AppError, Result};
use crate::feed::{RawIntervalReading, ReadingTypeDescriptor};

/// Reading-type attributes declared by a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub flow_direction: i32,
    pub kwh_price: Decimal,
    pub reading_unit: String,
}

impl Descriptor {
    pub fn into_new_reading_type(self, meter_id: &str) -> NewReadingType {
        NewReadingType {
            meter_id: meter_id.to_string(),
            flow_direction: self.flow_direction,
            kwh_price: self.kwh_price,
            reading_unit: self.reading_unit,
        }
    }
}

/// One interval reading with its value already in kWh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedReading {
    pub start_timestamp: i64,
    pub duration_seconds: i64,
    pub reading_value: i64,
}

impl MappedReading {
    pub fn bind(&self, reading_type_id: i64) -> NewIntervalReading {
        NewIntervalReading {
            reading_type_id,
            start_timestamp: self.start_timestamp,
            duration_seconds: self.duration_seconds,
            reading_value: self.reading_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedFeed {
    pub meter_id: String,
    pub descriptor: Descriptor,
    /// Source order.
    pub readings: Vec<MappedReading>,
}

/// Extract the descriptor and interval readings of a validated feed.
///
/// The first entry carrying a reading type and the first carrying an interval
/// block win independently; they may come from different entries.
pub fn map_feed(feed: &ValidatedFeed<'_>) -> Result<MappedFeed> {
    let raw_descriptor = feed
        .entries
        .iter()
        .filter_map(|entry| entry.content.as_ref())
        .find_map(|content| content.reading_type.as_ref())
        .ok_or_else(|| AppError::MissingData("ReadingType is missing in feed".to_string()))?;
    let block = feed
        .entries
        .iter()
        .filter_map(|entry| entry.content.as_ref())
        .find_map(|content| content.interval_block.as_deref())
        .ok_or_else(|| AppError::MissingData("IntervalBlock is missing in feed".to_string()))?;

    if block.is_empty() {
        return Err(AppError::MissingData(
            "IntervalBlock contains no readings".to_string(),
        ));
    }

    let descriptor = map_descriptor(raw_descriptor)?;
    let readings = block
        .iter()
        .enumerate()
        .map(|(idx, raw)| map_reading(idx, raw, &descriptor.reading_unit))
        .collect::<Result<Vec<_>>>()?;

    Ok(MappedFeed {
        meter_id: feed.id.to_string(),
        descriptor,
        readings,
    })
}

fn map_descriptor(raw: &ReadingTypeDescriptor) -> Result<Descriptor> {
    let kwh_price = raw
        .kwh_price
        .ok_or_else(|| AppError::MissingData("ReadingType.kWhPrice is missing".to_string()))?;
    if kwh_price < Decimal::ZERO {
        return Err(AppError::InvalidReading(format!(
            "kWhPrice must be non-negative, got {kwh_price}"
        )));
    }

    let reading_unit = raw
        .reading_unit
        .clone()
        .ok_or_else(|| AppError::MissingData("ReadingType.readingUnit is missing".to_string()))?;

    Ok(Descriptor {
        flow_direction: raw.flow_direction.unwrap_or(0),
        kwh_price,
        reading_unit,
    })
}

fn map_reading(idx: usize, raw: &RawIntervalReading, unit: &str) -> Result<MappedReading> {
    let missing =
        |field: &str| AppError::MissingData(format!("IntervalReading[{idx}].{field} is missing"));
    let invalid =
        |msg: String| AppError::InvalidReading(format!("IntervalReading[{idx}]: {msg}"));

    let value = raw.value.ok_or_else(|| missing("value"))?;
    let period = raw.time_period.as_ref().ok_or_else(|| missing("timePeriod"))?;
    let start = period.start.ok_or_else(|| missing("timePeriod.start"))?;
    let duration = period.duration.ok_or_else(|| missing("timePeriod.duration"))?;

    if value < 0 {
        return Err(invalid(format!("value must be non-negative, got {value}")));
    }
    if duration <= 0 {
        return Err(invalid(format!("duration must be positive, got {duration}")));
    }
    if OffsetDateTime::from_unix_timestamp(start).is_err() {
        return Err(invalid(format!("start {start} is outside the supported date range")));
    }

    Ok(MappedReading {
        start_timestamp: start,
        duration_seconds: duration,
        reading_value: normalize_to_kwh(value, unit),
    })
}
