use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::types::{NavigationButtons, PortalConfig, TimingConfig};
use crate::domain::chunk::DateChunk;
use crate::domain::dates::{
    DateEncoding, DateValue, matches_display, months_between, parse_month_header,
    to_display_string,
};
use crate::error::{Result, ScrapeError};
use crate::portal::selectors;
use crate::portal::window::WindowSetter;
use crate::ports::page::{PortalPage, WaitCondition};

/// Values the from/to inputs showed once the range was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy)]
enum Panel {
    First,
    Second,
}

impl Panel {
    fn input(self) -> &'static str {
        match self {
            Self::First => selectors::FROM_INPUT,
            Self::Second => selectors::TO_INPUT,
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::First => selectors::FIRST_MONTH_HEADER,
            Self::Second => selectors::SECOND_MONTH_HEADER,
        }
    }

    fn days(self) -> &'static str {
        match self {
            Self::First => selectors::FIRST_MONTH_DAYS,
            Self::Second => selectors::SECOND_MONTH_DAYS,
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => write!(f, "start"),
            Self::Second => write!(f, "end"),
        }
    }
}

/// Drives the two-panel date-picker widget.
pub struct CalendarNavigator {
    buttons: NavigationButtons,
    encoding: DateEncoding,
    step_settle: Duration,
    nav_click_delay: Duration,
    confirm_settle: Duration,
    element_timeout: Duration,
}

impl CalendarNavigator {
    pub fn new(portal: &PortalConfig, timing: &TimingConfig) -> Self {
        Self {
            buttons: portal.navigation,
            encoding: portal.display_encoding,
            step_settle: timing.step_settle(),
            nav_click_delay: Duration::from_millis(timing.nav_click_delay_ms),
            confirm_settle: Duration::from_millis(timing.confirm_settle_ms),
            element_timeout: timing.element_timeout(),
        }
    }

    /// Select `chunk` in the picker and verify what the inputs display.
    ///
    /// A mismatch after the first confirmation gets exactly one corrective
    /// pass that clicks days by their visible number.
    pub async fn set_range(&self, page: &dyn PortalPage, chunk: &DateChunk) -> Result<ConfirmedRange> {
        let (start, end) = (chunk.start(), chunk.end());
        debug!(
            from = %to_display_string(start, self.encoding, true),
            to = %to_display_string(end, self.encoding, true),
            "Setting date range"
        );

        self.select_in_panel(page, Panel::First, start).await?;
        tokio::time::sleep(self.step_settle).await;
        self.select_in_panel(page, Panel::Second, end).await?;
        self.confirm(page).await?;
        tokio::time::sleep(self.confirm_settle).await;

        let (from, to) = self.read_back(page).await?;
        if self.matches(&from, &to, start, end) {
            info!(from = %from, to = %to, "Date range confirmed");
            return Ok(ConfirmedRange { from, to });
        }

        warn!(
            shown_from = %from,
            shown_to = %to,
            "Date picker disagrees with requested range, correcting once"
        );
        self.corrective_pass(page, start, end).await?;
        tokio::time::sleep(self.confirm_settle).await;

        let (from, to) = self.read_back(page).await?;
        if self.matches(&from, &to, start, end) {
            info!(from = %from, to = %to, "Date range confirmed after correction");
            return Ok(ConfirmedRange { from, to });
        }

        Err(ScrapeError::ConfirmationMismatch {
            expected_from: to_display_string(start, self.encoding, true),
            expected_to: to_display_string(end, self.encoding, true),
            actual_from: from,
            actual_to: to,
        })
    }

    async fn select_in_panel(&self, page: &dyn PortalPage, panel: Panel, target: &DateValue) -> Result<()> {
        page.wait_for(panel.input(), WaitCondition::Visible, self.element_timeout)
            .await?;
        page.click(panel.input()).await?;
        tokio::time::sleep(self.step_settle).await;

        page.wait_for(panel.header(), WaitCondition::Visible, self.element_timeout)
            .await?;
        let header = page.require_text(panel.header()).await?;
        let (month, year) = parse_month_header(&header)?;
        let delta = months_between(&month, year, target.month_name(), target.year())?;
        debug!(%panel, header = %header, delta, "Month navigation");

        if delta != 0 {
            self.navigate(page, delta).await?;
        }
        self.click_day(page, panel, target.day()).await
    }

    /// Positive `delta` means the target month is earlier than the one shown.
    async fn navigate(&self, page: &dyn PortalPage, delta: i32) -> Result<()> {
        let (index, control) = if delta > 0 {
            (self.buttons.previous_index, "previous month button")
        } else {
            (self.buttons.next_index, "next month button")
        };
        let available = page.count(selectors::NAV_BUTTONS).await?;
        if available <= index {
            return Err(ScrapeError::NavigationControlMissing {
                control: control.into(),
            });
        }

        for _ in 0..delta.unsigned_abs() {
            page.click_nth(selectors::NAV_BUTTONS, index).await?;
            tokio::time::sleep(self.nav_click_delay).await;
        }
        Ok(())
    }

    async fn click_day(&self, page: &dyn PortalPage, panel: Panel, day: u32) -> Result<()> {
        let index = usize::try_from(day.saturating_sub(1)).unwrap_or_default();
        let Some(state) = page.element_state(panel.days(), index).await? else {
            return Err(ScrapeError::DayUnavailable {
                day,
                panel: panel.to_string(),
            });
        };
        if state.disabled {
            warn!(day, %panel, "Target day is disabled, leaving selection unchanged");
            return Ok(());
        }
        page.click_nth(panel.days(), index).await
    }

    async fn confirm(&self, page: &dyn PortalPage) -> Result<()> {
        if page.count(selectors::DONE_BUTTON).await? == 0 {
            return Err(ScrapeError::NavigationControlMissing {
                control: "done button".into(),
            });
        }
        page.click(selectors::DONE_BUTTON).await
    }

    async fn corrective_pass(&self, page: &dyn PortalPage, start: &DateValue, end: &DateValue) -> Result<()> {
        page.click(selectors::FROM_INPUT).await?;
        tokio::time::sleep(self.step_settle).await;

        for (panel, date) in [(Panel::First, start), (Panel::Second, end)] {
            let label = date.day().to_string();
            if !page.click_matching_text(panel.days(), &label).await? {
                warn!(day = date.day(), %panel, "No day control with matching text");
            }
        }
        self.confirm(page).await
    }

    async fn read_back(&self, page: &dyn PortalPage) -> Result<(String, String)> {
        let from = page.read_value(selectors::FROM_INPUT).await?.unwrap_or_default();
        let to = page.read_value(selectors::TO_INPUT).await?.unwrap_or_default();
        Ok((from, to))
    }

    fn matches(&self, from: &str, to: &str, start: &DateValue, end: &DateValue) -> bool {
        matches_display(from, start, self.encoding) && matches_display(to, end, self.encoding)
    }
}

#[async_trait]
impl WindowSetter for CalendarNavigator {
    async fn point_at(&self, page: &dyn PortalPage, chunk: &DateChunk) -> Result<()> {
        self.set_range(page, chunk).await.map(|_| ())
    }
}
