use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ReadingStore, StoreError, StoreTransaction};
use crate::domain::{IntervalReading, NewIntervalReading, NewReadingType, ReadingType};

#[derive(Debug, Default)]
struct MemoryState {
    reading_types: Vec<ReadingType>,
    readings: Vec<IntervalReading>,
    next_reading_type_id: i64,
    next_reading_id: i64,
}

impl MemoryState {
    fn reading_type(&self, meter_id: &str) -> Option<&ReadingType> {
        self.reading_types.iter().find(|rt| rt.meter_id == meter_id)
    }
}

/// Process-local store for tests and single-node runs.
///
/// Transactions hold the state lock until they commit or drop, so writers are
/// serialized and readers never observe a half-applied feed.
#[derive(Clone, Default)]
pub struct MemoryReadingStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn find_reading_type_by_meter_id(
        &self,
        meter_id: &str,
    ) -> Result<Option<ReadingType>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.reading_type(meter_id).cloned())
    }

    async fn find_readings_by_meter_id(
        &self,
        meter_id: &str,
    ) -> Result<Vec<IntervalReading>, StoreError> {
        let state = self.state.lock().await;
        let Some(rt) = state.reading_type(meter_id) else {
            return Ok(Vec::new());
        };

        let mut readings: Vec<IntervalReading> = state
            .readings
            .iter()
            .filter(|r| r.reading_type_id == rt.id)
            .cloned()
            .collect();
        readings.sort_by_key(|r| (r.start_timestamp, r.id));
        Ok(readings)
    }

    async fn list_all_reading_types(&self) -> Result<Vec<ReadingType>, StoreError> {
        let state = self.state.lock().await;
        let mut all = state.reading_types.clone();
        all.sort_by(|a, b| a.meter_id.cmp(&b.meter_id));
        Ok(all)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let next_reading_type_id = guard.next_reading_type_id;
        let next_reading_id = guard.next_reading_id;
        Ok(Box::new(MemoryStoreTransaction {
            guard,
            pending_types: Vec::new(),
            pending_readings: Vec::new(),
            next_reading_type_id,
            next_reading_id,
        }))
    }
}

pub struct MemoryStoreTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    pending_types: Vec<ReadingType>,
    pending_readings: Vec<IntervalReading>,
    next_reading_type_id: i64,
    next_reading_id: i64,
}

impl MemoryStoreTransaction {
    fn visible_reading_type(&self, meter_id: &str) -> Option<&ReadingType> {
        self.guard
            .reading_type(meter_id)
            .or_else(|| self.pending_types.iter().find(|rt| rt.meter_id == meter_id))
    }
}

#[async_trait::async_trait]
impl StoreTransaction for MemoryStoreTransaction {
    async fn find_reading_type_by_meter_id(
        &mut self,
        meter_id: &str,
    ) -> Result<Option<ReadingType>, StoreError> {
        Ok(self.visible_reading_type(meter_id).cloned())
    }

    async fn create_reading_type(
        &mut self,
        record: NewReadingType,
    ) -> Result<ReadingType, StoreError> {
        if self.visible_reading_type(&record.meter_id).is_some() {
            return Err(StoreError::Conflict(record.meter_id));
        }

        self.next_reading_type_id += 1;
        let rt = record.into_reading_type(self.next_reading_type_id);
        self.pending_types.push(rt.clone());
        Ok(rt)
    }

    async fn bulk_insert_readings(
        &mut self,
        readings: &[NewIntervalReading],
    ) -> Result<u64, StoreError> {
        for r in readings {
            self.next_reading_id += 1;
            self.pending_readings
                .push(r.clone().into_interval_reading(self.next_reading_id));
        }
        Ok(readings.len() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryStoreTransaction {
            mut guard,
            pending_types,
            pending_readings,
            next_reading_type_id,
            next_reading_id,
        } = *self;

        guard.reading_types.extend(pending_types);
        guard.readings.extend(pending_readings);
        guard.next_reading_type_id = next_reading_type_id;
        guard.next_reading_id = next_reading_id;
        Ok(())
    }
}
