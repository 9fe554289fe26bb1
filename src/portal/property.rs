use std::time::Duration;

use tracing::{info, warn};

use crate::config::types::TimingConfig;
use crate::domain::session::{ScrapeSession, SessionState};
use crate::error::{Result, ScrapeError};
use crate::portal::selectors;
use crate::ports::page::WaitCondition;

const RESERVATIONS_ITEM: &str = "Reservations";

/// Picks a property context and opens its reservations view.
pub struct PropertyLocator {
    keystroke: Duration,
    step_settle: Duration,
    page_settle: Duration,
    element_timeout: Duration,
}

impl PropertyLocator {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            keystroke: timing.keystroke(),
            step_settle: timing.step_settle(),
            page_settle: Duration::from_millis(timing.reload_settle_ms),
            element_timeout: timing.element_timeout(),
        }
    }

    pub async fn select_property(&self, session: &mut ScrapeSession, name: &str) -> Result<()> {
        session.require(SessionState::Authenticated)?;
        let page = session.page().clone();
        let not_found = || ScrapeError::PropertyNotFound {
            name: name.to_string(),
        };

        info!(property = name, "Searching for property");
        page.wait_for(
            selectors::PROPERTY_SEARCH_INPUT,
            WaitCondition::Visible,
            self.element_timeout,
        )
        .await?;
        page.type_slowly(selectors::PROPERTY_SEARCH_INPUT, name, self.keystroke)
            .await?;
        tokio::time::sleep(self.step_settle).await;

        page.wait_for(
            selectors::PROPERTY_RESULT_ROWS,
            WaitCondition::Visible,
            self.element_timeout,
        )
        .await
        .map_err(|_| not_found())?;
        page.wait_for(
            selectors::PROPERTY_LINK,
            WaitCondition::Visible,
            self.element_timeout,
        )
        .await
        .map_err(|_| not_found())?;

        let shown = page
            .read_text(selectors::PROPERTY_LINK)
            .await?
            .unwrap_or_default();
        if !shown.to_lowercase().contains(&name.to_lowercase()) {
            warn!(property = name, shown = %shown, "First search result has a different name");
        }
        page.click(selectors::PROPERTY_LINK).await?;
        tokio::time::sleep(self.page_settle).await;

        session.advance(SessionState::PropertySelected)?;
        info!(property = %shown, "Property selected");
        Ok(())
    }

    /// Open the reservations view from the property's side drawer.
    pub async fn open_reservations(&self, session: &mut ScrapeSession) -> Result<()> {
        let page = session.page().clone();

        page.wait_for(
            selectors::DRAWER_CONTENT,
            WaitCondition::Visible,
            self.element_timeout,
        )
        .await?;

        let items = page.count(selectors::DRAWER_ITEM_TEXT).await?;
        let mut target = None;
        for index in 0..items {
            if let Some(state) = page.element_state(selectors::DRAWER_ITEM_TEXT, index).await?
                && state.text.trim() == RESERVATIONS_ITEM
            {
                target = Some(index);
                break;
            }
        }
        let Some(index) = target else {
            return Err(ScrapeError::ElementNotFound {
                selector: format!("{} with text '{RESERVATIONS_ITEM}'", selectors::DRAWER_ITEM_TEXT),
            });
        };
        page.click_nth(selectors::DRAWER_ITEM_LINK, index).await?;
        tokio::time::sleep(self.page_settle).await;

        page.wait_for(
            selectors::DATE_TYPE_RADIO,
            WaitCondition::Visible,
            self.element_timeout,
        )
        .await?;
        session.advance(SessionState::ReservationsLoaded)?;
        info!("Reservations view loaded");
        Ok(())
    }
}
