pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod metrics_server;
pub mod observability;
pub mod report;
pub mod services;
pub mod store;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AppError, Result};
pub use http::{create_router, AppState};
pub use report::{HourlyReport, Report};
