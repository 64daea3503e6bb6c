//! Narrow persistence seam for reading types and interval readings.
//!
//! Writes happen only inside a [`StoreTransaction`]; dropping a transaction
//! without calling [`StoreTransaction::commit`] discards everything it wrote.

pub mod memory;
pub mod postgres;

pub use memory::MemoryReadingStore;
pub use postgres::PgReadingStore;

use crate::domain::{IntervalReading, NewIntervalReading, NewReadingType, ReadingType};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Another writer created a reading type for this meter first.
    #[error("reading type already exists for meter {0}")]
    Conflict(String),
}

#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
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

#[async_trait::async_trait]
pub trait StoreTransaction: Send {
    async fn find_reading_type_by_meter_id(
        &mut self,
        meter_id: &str,
    ) -> Result<Option<ReadingType>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the meter already has a reading type.
    async fn create_reading_type(
        &mut self,
        record: NewReadingType,
    ) -> Result<ReadingType, StoreError>;

    async fn bulk_insert_readings(
        &mut self,
        readings: &[NewIntervalReading],
    ) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
