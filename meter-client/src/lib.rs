pub mod db;
pub mod domain;
pub mod store;

pub use store::{MemoryReadingStore, PgReadingStore, ReadingStore, StoreError, StoreTransaction};
