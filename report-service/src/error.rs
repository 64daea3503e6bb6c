use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meter_client::StoreError;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Why a report could not be produced for a meter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportGenerationReason {
    #[error("no reading type found")]
    UnknownMeter,
    #[error("no interval readings found")]
    NoReadings,
    #[error("{0}")]
    Arithmetic(String),
}

/// Request-scoped faults. None of these are fatal to the process.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("missing data: {0}")]
    MissingData(String),
    #[error("failed to parse feed: {0}")]
    Parsing(#[from] serde_json::Error),
    #[error("invalid reading: {0}")]
    InvalidReading(String),
    #[error("database operation failed: {source}")]
    DatabaseOperation {
        meter_id: Option<String>,
        source: StoreError,
    },
    #[error("report generation failed for meter {meter_id}: {reason}")]
    ReportGeneration {
        meter_id: String,
        reason: ReportGenerationReason,
    },
}

impl AppError {
    pub fn database(meter_id: Option<&str>, source: StoreError) -> Self {
        AppError::DatabaseOperation {
            meter_id: meter_id.map(str::to_string),
            source,
        }
    }

    pub fn report_generation(meter_id: &str, reason: ReportGenerationReason) -> Self {
        AppError::ReportGeneration {
            meter_id: meter_id.to_string(),
            reason,
        }
    }

    /// Stable label used in metrics and response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingData(_) => "missing_data",
            AppError::Parsing(_) => "parsing",
            AppError::InvalidReading(_) => "invalid_reading",
            AppError::DatabaseOperation { .. } => "database_operation",
            AppError::ReportGeneration { .. } => "report_generation",
        }
    }

    /// True when the caller's input caused the fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            AppError::MissingData(_) | AppError::Parsing(_) | AppError::InvalidReading(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingData(_) | AppError::Parsing(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidReading(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseOperation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ReportGeneration { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
