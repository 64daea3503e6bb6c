use async_trait::async_trait;
use meter_client::{
    domain::{IntervalReading, ReadingType},
    ReadingStore, StoreError, StoreTransaction,
};

mockall::mock! {
    pub Store {}

    #[async_trait]
    impl ReadingStore for Store {
        async fn find_reading_type_by_meter_id(
            &self,
            meter_id: &str,
        ) -> Result<Option<ReadingType>, StoreError>;

        async fn find_readings_by_meter_id(
            &self,
            meter_id: &str,
        ) -> Result<Vec<IntervalReading>, StoreError>;

        async fn list_all_reading_types(&self) -> Result<Vec<ReadingType>, StoreError>;

        async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
    }
}

/// A single-entry feed document with `(value, start)` readings of 15 minutes.
pub fn feed_json(meter_id: &str, price: &str, unit: &str, readings: &[(i64, i64)]) -> String {
    let block: Vec<serde_json::Value> = readings
        .iter()
        .map(|(value, start)| {
            serde_json::json!({
                "value": value,
                "timePeriod": {"start": start, "duration": 900},
            })
        })
        .collect();

    serde_json::json!({
        "id": meter_id,
        "title": "interval usage",
        "entries": [{
            "content": {
                "readingType": {"flowDirection": 1, "kWhPrice": price, "readingUnit": unit},
                "intervalBlock": block,
            }
        }],
    })
    .to_string()
}
