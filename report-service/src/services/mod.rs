pub mod ingest;
pub mod reports;
pub mod resolver;

pub use ingest::{IngestService, IngestSummary};
pub use reports::ReportService;
pub use resolver::{resolve_reading_type, Resolved};
