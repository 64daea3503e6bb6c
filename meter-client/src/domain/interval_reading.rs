use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IntervalReading {
    pub id: i64,
    pub reading_type_id: i64,
    /// Epoch seconds, UTC.
    pub start_timestamp: i64,
    pub duration_seconds: i64,
    /// Already normalized to kWh.
    pub reading_value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIntervalReading {
    pub reading_type_id: i64,
    pub start_timestamp: i64,
    pub duration_seconds: i64,
    pub reading_value: i64,
}

impl NewIntervalReading {
    pub fn into_interval_reading(self, id: i64) -> IntervalReading {
        IntervalReading {
            id,
            reading_type_id: self.reading_type_id,
            start_timestamp: self.start_timestamp,
            duration_seconds: self.duration_seconds,
            reading_value: self.reading_value,
        }
    }
}
