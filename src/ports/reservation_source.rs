use async_trait::async_trait;

use crate::domain::scrape_request::{ScrapeReport, ScrapeRequest};
use crate::error::Result;

#[async_trait]
pub trait ReservationSource: Send + Sync {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeReport>;
}
