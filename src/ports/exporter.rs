use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::reservation::ReservationRecord;
use crate::error::Result;

#[async_trait]
pub trait ReportExporter: Send + Sync {
    /// Write all records in one go and return where they went.
    async fn export(&self, records: &[ReservationRecord]) -> Result<PathBuf>;
}
