use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use super::{ReadingStore, StoreError, StoreTransaction};
use crate::db::queries;
use crate::domain::{IntervalReading, NewIntervalReading, NewReadingType, ReadingType};

#[derive(Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(uri)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        queries::ensure_schema(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadingStore for PgReadingStore {
    async fn find_reading_type_by_meter_id(
        &self,
        meter_id: &str,
    ) -> Result<Option<ReadingType>, StoreError> {
        Ok(queries::find_reading_type_by_meter_id(&self.pool, meter_id).await?)
    }

    async fn find_readings_by_meter_id(
        &self,
        meter_id: &str,
    ) -> Result<Vec<IntervalReading>, StoreError> {
        Ok(queries::readings_by_meter_id(&self.pool, meter_id).await?)
    }

    async fn list_all_reading_types(&self) -> Result<Vec<ReadingType>, StoreError> {
        Ok(queries::all_reading_types(&self.pool).await?)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back when dropped uncommitted.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn find_reading_type_by_meter_id(
        &mut self,
        meter_id: &str,
    ) -> Result<Option<ReadingType>, StoreError> {
        Ok(queries::find_reading_type_by_meter_id(&mut *self.tx, meter_id).await?)
    }

    async fn create_reading_type(
        &mut self,
        record: NewReadingType,
    ) -> Result<ReadingType, StoreError> {
        queries::insert_reading_type_if_absent(&mut *self.tx, &record)
            .await?
            .ok_or(StoreError::Conflict(record.meter_id))
    }

    async fn bulk_insert_readings(
        &mut self,
        readings: &[NewIntervalReading],
    ) -> Result<u64, StoreError> {
        if readings.is_empty() {
            return Ok(0);
        }
        Ok(queries::insert_readings(&mut self.tx, readings).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
