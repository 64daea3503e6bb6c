//! Feed validation, mapping and unit normalization. All pure.

pub mod mapping;
pub mod units;
pub mod validate;

pub use mapping::{map_feed, Descriptor, MappedFeed, MappedReading};
pub use units::normalize_to_kwh;
pub use validate::{validate_feed, ValidatedFeed};
