use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::ports::page::PortalPage;

/// Opens a fresh page in a new browser. Closing the page releases the browser.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn PortalPage>>;
}
