use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Attached to the DOM.
    Present,
    /// Attached and rendered with a non-empty box.
    Visible,
    /// Absent or not rendered.
    Hidden,
}

/// Snapshot of one element's interactive state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    pub disabled: bool,
    pub checked: bool,
    pub text: String,
}

/// The DOM capabilities the portal flows need.
///
/// Everything under `portal/` is written against this trait, never against a
/// concrete browser, so tests can replay canned page states.
#[async_trait]
pub trait PortalPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;
    async fn reload(&self) -> Result<()>;
    async fn current_url(&self) -> Result<String>;

    /// Trimmed text content of the first match, `None` when nothing matches.
    async fn read_text(&self, selector: &str) -> Result<Option<String>>;
    /// `value` of the first matching input.
    async fn read_value(&self, selector: &str) -> Result<Option<String>>;
    async fn inner_html(&self, selector: &str) -> Result<Option<String>>;
    async fn count(&self, selector: &str) -> Result<usize>;
    async fn element_state(&self, selector: &str, index: usize) -> Result<Option<ElementState>>;

    /// Click the `index`th match. Fails with `ElementNotFound` when there is none.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<()>;
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;
    async fn type_slowly(&self, selector: &str, text: &str, per_char: Duration) -> Result<()>;
    /// Fails with `WaitTimeout` when the condition does not hold in time.
    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<()>;
    async fn scroll_to_bottom(&self, selector: &str) -> Result<()>;
    async fn close(&self) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()> {
        self.click_nth(selector, 0).await
    }

    /// Click the first match whose trimmed text equals `text`. Returns whether
    /// anything was clicked.
    async fn click_matching_text(&self, selector: &str, text: &str) -> Result<bool> {
        let total = self.count(selector).await?;
        for index in 0..total {
            let Some(state) = self.element_state(selector, index).await? else {
                continue;
            };
            if state.text.trim() == text {
                self.click_nth(selector, index).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn require_text(&self, selector: &str) -> Result<String> {
        self.read_text(selector)
            .await?
            .ok_or_else(|| ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}
