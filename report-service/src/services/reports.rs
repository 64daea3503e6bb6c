use std::sync::Arc;

use meter_client::ReadingStore;

use crate::error::{AppError, ReportGenerationReason, Result};
use crate::report::{aggregate, Report};

/// Read side: per-meter hourly reports and the list of known meters.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReadingStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self, meter_id: &str) -> Result<Report> {
        let result = self.build_report(meter_id).await;

        match &result {
            Ok(report) => {
                metrics::counter!("reports_generated_total").increment(1);
                tracing::info!(
                    meter_id,
                    hours = report.hourly_reports.len(),
                    "generated report"
                );
            }
            Err(e) => {
                metrics::counter!("report_generation_failed_total", "kind" => e.kind())
                    .increment(1);
                if e.is_client_fault() || matches!(e, AppError::ReportGeneration { .. }) {
                    tracing::warn!(meter_id, error = %e, "no report for meter");
                } else {
                    tracing::error!(meter_id, error = %e, "report generation failed");
                }
            }
        }

        result
    }

    async fn build_report(&self, meter_id: &str) -> Result<Report> {
        let reading_type = self
            .store
            .find_reading_type_by_meter_id(meter_id)
            .await
            .map_err(|e| AppError::database(Some(meter_id), e))?
            .ok_or_else(|| {
                AppError::report_generation(meter_id, ReportGenerationReason::UnknownMeter)
            })?;

        let readings = self
            .store
            .find_readings_by_meter_id(meter_id)
            .await
            .map_err(|e| AppError::database(Some(meter_id), e))?;
        tracing::debug!(meter_id, count = readings.len(), "loaded interval readings");

        aggregate(meter_id, &readings, reading_type.kwh_price)
    }

    pub async fn meter_ids(&self) -> Result<Vec<String>> {
        let reading_types = self.store.list_all_reading_types().await.map_err(|e| {
            tracing::error!(error = %e, "failed to list meters");
            AppError::database(None, e)
        })?;

        Ok(reading_types.into_iter().map(|rt| rt.meter_id).collect())
    }
}
