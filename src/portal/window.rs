use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::types::{PortalConfig, TimingConfig};
use crate::domain::chunk::DateChunk;
use crate::domain::dates::{DateEncoding, to_display_string};
use crate::error::Result;
use crate::ports::page::PortalPage;

/// Points the reservations view at one chunk's date window.
#[async_trait]
pub trait WindowSetter: Send + Sync {
    async fn point_at(&self, page: &dyn PortalPage, chunk: &DateChunk) -> Result<()>;
}

/// Rewrites the window's query parameters on the current URL and reloads.
pub struct UrlWindow {
    start_param: String,
    end_param: String,
    encoding: DateEncoding,
    settle: Duration,
}

impl UrlWindow {
    pub fn new(portal: &PortalConfig, timing: &TimingConfig) -> Self {
        Self {
            start_param: portal.url_start_param.clone(),
            end_param: portal.url_end_param.clone(),
            encoding: portal.display_encoding,
            settle: Duration::from_millis(timing.page_settle_ms),
        }
    }

    pub fn rewrite(&self, current: &str, chunk: &DateChunk) -> Result<String> {
        let mut url = Url::parse(current)?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != &self.start_param && k != &self.end_param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (k, v) in &kept {
                query.append_pair(k, v);
            }
            query.append_pair(
                &self.start_param,
                &to_display_string(chunk.start(), self.encoding, true),
            );
            query.append_pair(
                &self.end_param,
                &to_display_string(chunk.end(), self.encoding, true),
            );
        }
        Ok(url.into())
    }
}

#[async_trait]
impl WindowSetter for UrlWindow {
    async fn point_at(&self, page: &dyn PortalPage, chunk: &DateChunk) -> Result<()> {
        let current = page.current_url().await?;
        let target = self.rewrite(&current, chunk)?;
        debug!(url = %target, "Loading chunk window");
        page.goto(&target).await?;
        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}
