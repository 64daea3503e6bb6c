//! Hourly aggregation of stored interval readings into a cost report.

use std::collections::BTreeMap;

use meter_client::domain::IntervalReading;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use crate::error::{AppError, ReportGenerationReason, Result};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyReport {
    /// `YYYY-MM-DD HH:00`, UTC.
    pub hour: String,
    pub kwh_used: i64,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub meter_id: String,
    pub total_energy: i64,
    pub total_cost: Decimal,
    pub hourly_reports: Vec<HourlyReport>,
}

/// Start of the UTC hour containing `ts` (epoch seconds).
pub fn hour_start(ts: i64) -> i64 {
    ts.div_euclid(SECONDS_PER_HOUR) * SECONDS_PER_HOUR
}

pub fn hour_label(hour_start: i64) -> Option<String> {
    let at = OffsetDateTime::from_unix_timestamp(hour_start).ok()?;
    at.format(format_description!("[year]-[month]-[day] [hour]:00")).ok()
}

/// Group `readings` by UTC start hour and price each hour at `kwh_price`.
///
/// Hours without readings are omitted. Entries are ordered by hour label.
pub fn aggregate(
    meter_id: &str,
    readings: &[IntervalReading],
    kwh_price: Decimal,
) -> Result<Report> {
    let fail = |reason: ReportGenerationReason| AppError::report_generation(meter_id, reason);
    let overflow =
        |what: &str| fail(ReportGenerationReason::Arithmetic(format!("{what} overflowed")));
    // rust_decimal rounds instead of failing once a result needs more than
    // 28 significant digits; a scale below the price's means digits were lost.
    let exact = |value: Option<Decimal>, what: &str| match value {
        Some(mut v) if v.is_zero() => {
            v.rescale(kwh_price.scale());
            Ok(v)
        }
        Some(v) if v.scale() >= kwh_price.scale() => Ok(v),
        Some(_) => Err(fail(ReportGenerationReason::Arithmetic(format!(
            "{what} exceeds decimal precision"
        )))),
        None => Err(overflow(what)),
    };

    if readings.is_empty() {
        return Err(fail(ReportGenerationReason::NoReadings));
    }

    let mut buckets: BTreeMap<i64, i64> = BTreeMap::new();
    for r in readings {
        let kwh = buckets.entry(hour_start(r.start_timestamp)).or_insert(0);
        *kwh = kwh.checked_add(r.reading_value).ok_or_else(|| overflow("hourly kWh"))?;
    }

    let mut hourly_reports = Vec::with_capacity(buckets.len());
    for (start, kwh_used) in buckets {
        let hour = hour_label(start).ok_or_else(|| {
            fail(ReportGenerationReason::Arithmetic(format!(
                "hour starting at {start} cannot be rendered as a date"
            )))
        })?;
        let cost = exact(kwh_price.checked_mul(Decimal::from(kwh_used)), "hourly cost")?;
        hourly_reports.push(HourlyReport { hour, kwh_used, cost });
    }
    hourly_reports.sort_by(|a, b| a.hour.cmp(&b.hour));

    let mut total_energy: i64 = 0;
    let mut total_cost = Decimal::ZERO;
    for h in &hourly_reports {
        total_energy = total_energy
            .checked_add(h.kwh_used)
            .ok_or_else(|| overflow("total kWh"))?;
        total_cost = exact(total_cost.checked_add(h.cost), "total cost")?;
    }

    Ok(Report {
        meter_id: meter_id.to_string(),
        total_energy,
        total_cost,
        hourly_reports,
    })
}
