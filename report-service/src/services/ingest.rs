use std::sync::Arc;

use meter_client::{domain::NewIntervalReading, ReadingStore, StoreError};

use super::resolver::resolve_reading_type;
use crate::error::{AppError, Result};
use crate::feed::{parse_feed, Feed};
use crate::transform::{map_feed, validate_feed, MappedFeed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub meter_id: String,
    pub reading_type_created: bool,
    pub readings_inserted: u64,
}

/// Turns raw feed documents into stored reading types and interval readings.
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn ReadingStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    /// Decode, validate, map and persist one feed atomically.
    ///
    /// Nothing touches the store until the feed has passed validation and
    /// mapping. A failure after that rolls the whole feed back.
    pub async fn ingest(&self, raw: &[u8]) -> Result<IngestSummary> {
        let feed = parse_feed(raw).map_err(|e| rejected(None, e))?;
        let validated = validate_feed(feed.as_ref())
            .map_err(|e| rejected(declared_meter_id(feed.as_ref()), e))?;
        let meter_id = validated.id;

        let mapped = map_feed(&validated).map_err(|e| rejected(Some(meter_id), e))?;
        let summary = self
            .store_feed(mapped)
            .await
            .map_err(|e| rejected(Some(meter_id), e))?;

        metrics::counter!("feeds_ingested_total").increment(1);
        metrics::counter!("interval_readings_ingested_total").increment(summary.readings_inserted);
        tracing::info!(
            meter_id,
            readings = summary.readings_inserted,
            reading_type_created = summary.reading_type_created,
            "stored feed"
        );

        Ok(summary)
    }

    async fn store_feed(&self, feed: MappedFeed) -> Result<IngestSummary> {
        let MappedFeed {
            meter_id,
            descriptor,
            readings,
        } = feed;
        let db_err = |source: StoreError| AppError::database(Some(&meter_id), source);

        let mut tx = self.store.begin().await.map_err(db_err)?;
        let resolved = resolve_reading_type(tx.as_mut(), &meter_id, descriptor).await?;

        let rows: Vec<NewIntervalReading> = readings
            .iter()
            .map(|r| r.bind(resolved.reading_type.id))
            .collect();
        let readings_inserted = tx.bulk_insert_readings(&rows).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok(IngestSummary {
            meter_id: meter_id.clone(),
            reading_type_created: resolved.created,
            readings_inserted,
        })
    }
}

/// Meter id of a feed that may still fail validation, when it has one.
fn declared_meter_id(feed: Option<&Feed>) -> Option<&str> {
    feed.and_then(|f| f.id.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn rejected(meter_id: Option<&str>, err: AppError) -> AppError {
    metrics::counter!("feeds_rejected_total", "kind" => err.kind()).increment(1);

    let meter_id = meter_id.unwrap_or("<unknown>");
    if err.is_client_fault() {
        tracing::warn!(meter_id, error = %err, "rejected feed");
    } else {
        tracing::error!(meter_id, error = %err, "failed to store feed");
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{feed_json, MockStore};
    use meter_client::MemoryReadingStore;
    use rust_decimal::Decimal;

    fn service() -> (IngestService, MemoryReadingStore) {
        let store = MemoryReadingStore::new();
        (IngestService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn stores_reading_type_and_normalized_readings() {
        let (svc, store) = service();
        let raw = feed_json("M1", "0.10", "Wh", &[(1000, 3600), (2500, 3700)]);

        let summary = svc.ingest(raw.as_bytes()).await.unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                meter_id: "M1".to_string(),
                reading_type_created: true,
                readings_inserted: 2,
            }
        );
        let rt = store.find_reading_type_by_meter_id("M1").await.unwrap().unwrap();
        assert_eq!(rt.kwh_price, Decimal::new(10, 2));

        let values: Vec<i64> = store
            .find_readings_by_meter_id("M1")
            .await
            .unwrap()
            .iter()
            .map(|r| r.reading_value)
            .collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn second_feed_appends_and_keeps_first_descriptor() {
        let (svc, store) = service();

        svc.ingest(feed_json("M1", "0.10", "kWh", &[(1, 0)]).as_bytes())
            .await
            .unwrap();
        let summary = svc
            .ingest(feed_json("M1", "0.50", "kWh", &[(2, 60)]).as_bytes())
            .await
            .unwrap();

        assert!(!summary.reading_type_created);
        let rt = store.find_reading_type_by_meter_id("M1").await.unwrap().unwrap();
        assert_eq!(rt.kwh_price, Decimal::new(10, 2));
        assert_eq!(store.find_readings_by_meter_id("M1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_feeds_never_reach_the_store() {
        let mut store = MockStore::new();
        store.expect_begin().never();
        store.expect_find_reading_type_by_meter_id().never();
        let svc = IngestService::new(Arc::new(store));

        for raw in [
            r#"{"entries": [{"content": {}}]}"#,
            r#"{"id": "M1"}"#,
            r#"{"id": "M1", "entries": []}"#,
            r#"null"#,
        ] {
            let res = svc.ingest(raw.as_bytes()).await;
            assert!(matches!(res, Err(AppError::MissingData(_))), "{raw}");
        }

        let res = svc.ingest(b"<feed><id>M1</id></feed>").await;
        assert!(matches!(res, Err(AppError::Parsing(_))));

        let no_block = r#"{"id": "M1", "entries": [
            {"content": {"readingType": {"kWhPrice": "1", "readingUnit": "kWh"}}}
        ]}"#;
        let res = svc.ingest(no_block.as_bytes()).await;
        assert!(matches!(res, Err(AppError::MissingData(_))));
    }

    #[test]
    fn rejection_reports_meter_id_when_feed_declares_one() {
        let feed = parse_feed(br#"{"id": "M1", "entries": []}"#).unwrap();
        assert!(validate_feed(feed.as_ref()).is_err());
        assert_eq!(declared_meter_id(feed.as_ref()), Some("M1"));

        let blank = parse_feed(br#"{"id": "  ", "entries": []}"#).unwrap();
        assert_eq!(declared_meter_id(blank.as_ref()), None);
        assert_eq!(declared_meter_id(None), None);
    }

    #[tokio::test]
    async fn one_bad_reading_rejects_the_whole_feed() {
        let (svc, store) = service();
        let raw = r#"{"id": "M1", "entries": [{"content": {
            "readingType": {"kWhPrice": "0.10", "readingUnit": "kWh"},
            "intervalBlock": [
                {"value": 1, "timePeriod": {"start": 0, "duration": 60}},
                {"value": 1, "timePeriod": {"start": 60, "duration": 0}}
            ]}}]}"#;

        let res = svc.ingest(raw.as_bytes()).await;

        assert!(matches!(res, Err(AppError::InvalidReading(_))));
        assert!(store.find_reading_type_by_meter_id("M1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failure_is_a_database_fault() {
        let mut store = MockStore::new();
        store
            .expect_begin()
            .times(1)
            .returning(|| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));
        let svc = IngestService::new(Arc::new(store));

        let res = svc
            .ingest(feed_json("M1", "0.10", "kWh", &[(1, 0)]).as_bytes())
            .await;

        assert!(matches!(
            res,
            Err(AppError::DatabaseOperation { meter_id: Some(ref id), .. }) if id == "M1"
        ));
    }
}
