pub mod interval_reading;
pub mod reading_type;

pub use interval_reading::{IntervalReading, NewIntervalReading};
pub use reading_type::{NewReadingType, ReadingType};
