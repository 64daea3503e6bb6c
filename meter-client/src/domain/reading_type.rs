use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-meter metadata fixed by the first feed that mentions the meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReadingType {
    pub id: i64,
    pub meter_id: String,
    /// 0 = delivered to the customer, 1 = received from the customer.
    pub flow_direction: i32,
    pub kwh_price: Decimal,
    pub reading_unit: String,
}

/// A reading type that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReadingType {
    pub meter_id: String,
    pub flow_direction: i32,
    pub kwh_price: Decimal,
    pub reading_unit: String,
}

impl NewReadingType {
    pub fn into_reading_type(self, id: i64) -> ReadingType {
        ReadingType {
            id,
            meter_id: self.meter_id,
            flow_direction: self.flow_direction,
            kwh_price: self.kwh_price,
            reading_unit: self.reading_unit,
        }
    }
}
