use meter_client::{domain::ReadingType, StoreError, StoreTransaction};

use crate::error::{AppError, Result};
use crate::transform::Descriptor;

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub reading_type: ReadingType,
    pub created: bool,
}

/// Find the meter's reading type or create it from `descriptor`.
///
/// An existing record is returned unchanged; the feed's descriptor is dropped.
/// Losing a creation race to a concurrent writer resolves to the winner's record.
pub async fn resolve_reading_type(
    tx: &mut dyn StoreTransaction,
    meter_id: &str,
    descriptor: Descriptor,
) -> Result<Resolved> {
    let db_err = |source: StoreError| AppError::database(Some(meter_id), source);

    if let Some(existing) = tx.find_reading_type_by_meter_id(meter_id).await.map_err(db_err)? {
        if existing.kwh_price != descriptor.kwh_price
            || existing.reading_unit != descriptor.reading_unit
            || existing.flow_direction != descriptor.flow_direction
        {
            tracing::debug!(
                meter_id,
                "feed descriptor differs from stored reading type; keeping stored"
            );
        }
        return Ok(Resolved {
            reading_type: existing,
            created: false,
        });
    }

    match tx.create_reading_type(descriptor.into_new_reading_type(meter_id)).await {
        Ok(reading_type) => {
            tracing::info!(meter_id, reading_type_id = reading_type.id, "created reading type");
            Ok(Resolved {
                reading_type,
                created: true,
            })
        }
        Err(StoreError::Conflict(_)) => {
            tracing::info!(meter_id, "reading type created concurrently, re-reading");
            let existing = tx
                .find_reading_type_by_meter_id(meter_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| db_err(StoreError::Conflict(meter_id.to_string())))?;
            Ok(Resolved {
                reading_type: existing,
                created: false,
            })
        }
        Err(e) => Err(db_err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_client::{
        domain::{NewIntervalReading, NewReadingType},
        MemoryReadingStore, ReadingStore,
    };
    use rust_decimal::Decimal;

    fn descriptor(price: i64, unit: &str) -> Descriptor {
        Descriptor {
            flow_direction: 0,
            kwh_price: Decimal::new(price, 2),
            reading_unit: unit.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_on_first_sight_then_reuses() {
        let store = MemoryReadingStore::new();

        let mut tx = store.begin().await.unwrap();
        let first = resolve_reading_type(tx.as_mut(), "M1", descriptor(10, "Wh"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let second = resolve_reading_type(tx.as_mut(), "M1", descriptor(99, "kWh"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.reading_type, second.reading_type);
        assert_eq!(second.reading_type.kwh_price, Decimal::new(10, 2));
        assert_eq!(second.reading_type.reading_unit, "Wh");
        assert_eq!(store.list_all_reading_types().await.unwrap().len(), 1);
    }

    /// Simulates a concurrent writer committing between our lookup and insert.
    struct LostRace {
        winner: ReadingType,
        lookups: usize,
    }

    #[async_trait::async_trait]
    impl StoreTransaction for LostRace {
        async fn find_reading_type_by_meter_id(
            &mut self,
            _meter_id: &str,
        ) -> Result<Option<ReadingType>, StoreError> {
            self.lookups += 1;
            Ok((self.lookups > 1).then(|| self.winner.clone()))
        }

        async fn create_reading_type(
            &mut self,
            record: NewReadingType,
        ) -> Result<ReadingType, StoreError> {
            Err(StoreError::Conflict(record.meter_id))
        }

        async fn bulk_insert_readings(
            &mut self,
            readings: &[NewIntervalReading],
        ) -> Result<u64, StoreError> {
            Ok(readings.len() as u64)
        }

        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn creation_conflict_resolves_to_existing_record() {
        let winner = ReadingType {
            id: 42,
            meter_id: "M1".to_string(),
            flow_direction: 1,
            kwh_price: Decimal::new(5, 2),
            reading_unit: "kWh".to_string(),
        };
        let mut tx = LostRace {
            winner: winner.clone(),
            lookups: 0,
        };

        let resolved = resolve_reading_type(&mut tx, "M1", descriptor(10, "Wh"))
            .await
            .unwrap();

        assert_eq!(resolved.reading_type, winner);
        assert!(!resolved.created);
        assert_eq!(tx.lookups, 2);
    }

    struct BrokenTransaction;

    #[async_trait::async_trait]
    impl StoreTransaction for BrokenTransaction {
        async fn find_reading_type_by_meter_id(
            &mut self,
            _meter_id: &str,
        ) -> Result<Option<ReadingType>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn create_reading_type(
            &mut self,
            _record: NewReadingType,
        ) -> Result<ReadingType, StoreError> {
            unreachable!("lookup fails first")
        }

        async fn bulk_insert_readings(
            &mut self,
            _readings: &[NewIntervalReading],
        ) -> Result<u64, StoreError> {
            unreachable!("lookup fails first")
        }

        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn lookup_failure_is_a_database_fault() {
        let res = resolve_reading_type(&mut BrokenTransaction, "M1", descriptor(10, "Wh")).await;
        assert!(matches!(
            res,
            Err(AppError::DatabaseOperation { meter_id: Some(ref id), .. }) if id == "M1"
        ));
    }
}
