use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::types::{PortalConfig, TimingConfig};
use crate::domain::chunk::DateChunk;
use crate::domain::reservation::{
    CardDetails, PaymentDetails, ReservationRecord, ReservationStatus, RowSummary,
};
use crate::error::{Result, ScrapeError};
use crate::portal::parsers::dialog::{DialogContent, parse_dialog};
use crate::portal::parsers::rows::{parse_rows, parse_total_results};
use crate::portal::retry::{RetryPolicy, with_retry};
use crate::portal::selectors;
use crate::portal::window::WindowSetter;
use crate::ports::page::{PortalPage, WaitCondition};

/// Records collected during a run, keyed by reservation id.
///
/// An id counts as seen only once its record is stored here, so a window
/// that fails part-way keeps the rows it already extracted.
#[derive(Debug, Default)]
pub struct RunRecords {
    seen: HashSet<String>,
    records: Vec<ReservationRecord>,
}

impl RunRecords {
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns `false` and drops `record` when its id is already recorded.
    pub fn record(&mut self, record: ReservationRecord) -> bool {
        if !self.seen.insert(record.reservation_id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReservationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ReservationRecord> {
        self.records
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    FiltersApplied,
    Stabilizing,
    Paginating { page: u32 },
    Done,
}

/// Filter labels, page size and timings for one results view.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub date_type_filter: String,
    pub payment_filters: Vec<String>,
    pub page_size: u32,
    pub step_settle: Duration,
    pub element_timeout: Duration,
    pub dialog_timeout: Duration,
    pub dialog_settle: Duration,
    pub dialog_close_settle: Duration,
    pub stabilization_interval: Duration,
    pub stabilization_max_polls: u32,
    pub extraction: RetryPolicy,
    pub page_settle: Duration,
    pub max_page_reloads: u32,
    pub reload_settle: Duration,
}

impl ScraperSettings {
    pub fn new(portal: &PortalConfig, timing: &TimingConfig) -> Self {
        Self {
            date_type_filter: portal.date_type_filter.clone(),
            payment_filters: portal.payment_filters.clone(),
            page_size: portal.page_size,
            step_settle: timing.step_settle(),
            element_timeout: timing.element_timeout(),
            dialog_timeout: Duration::from_millis(timing.dialog_timeout_ms),
            dialog_settle: Duration::from_millis(timing.dialog_settle_ms),
            dialog_close_settle: Duration::from_millis(timing.dialog_close_settle_ms),
            stabilization_interval: Duration::from_millis(timing.stabilization_interval_ms),
            stabilization_max_polls: timing.stabilization_max_polls,
            extraction: RetryPolicy::extraction(timing),
            page_settle: Duration::from_millis(timing.page_settle_ms),
            max_page_reloads: timing.max_page_reloads,
            reload_settle: Duration::from_millis(timing.reload_settle_ms),
        }
    }
}

/// Scrapes every results page of one date window.
pub struct ReservationPageScraper {
    settings: ScraperSettings,
}

impl ReservationPageScraper {
    pub fn new(settings: ScraperSettings) -> Self {
        Self { settings }
    }

    /// Point the view at `chunk`, apply filters and walk every page.
    ///
    /// Rows already in `collected` are skipped without opening their dialog;
    /// new rows are added to it as they are extracted and stay there even
    /// when the window later fails. Any non-fatal failure reloads the view
    /// and starts over, bounded by `max_page_reloads`. Returns how many
    /// records this window added.
    pub async fn scrape(
        &self,
        page: &dyn PortalPage,
        window: &dyn WindowSetter,
        chunk: &DateChunk,
        collected: &mut RunRecords,
    ) -> Result<usize> {
        let before = collected.len();
        let mut reloads = 0;
        let mut total = None;
        let mut phase = Phase::Start;

        loop {
            let step = match phase {
                Phase::Start => self
                    .open_window(page, window, chunk)
                    .await
                    .map(|()| Phase::FiltersApplied),
                Phase::FiltersApplied => self.submit(page).await.map(|()| Phase::Stabilizing),
                Phase::Stabilizing => match self.stabilize(page).await {
                    Ok(0) => {
                        info!(chunk = %chunk, "No reservations in window");
                        Ok(Phase::Done)
                    }
                    Ok(_) => match self.set_page_size(page).await {
                        Ok(()) => {
                            total = self.read_total(page).await;
                            info!(chunk = %chunk, total = ?total, "Reservations to fetch");
                            Ok(Phase::Paginating { page: 1 })
                        }
                        Err(e) => Err(e),
                    },
                    Err(e) => Err(e),
                },
                Phase::Paginating { page: number } => self
                    .process_page(page, number, collected, total)
                    .await
                    .map(|more| {
                        if more {
                            Phase::Paginating { page: number + 1 }
                        } else {
                            Phase::Done
                        }
                    }),
                Phase::Done => break,
            };

            phase = match step {
                Ok(next) => next,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let failed_page = match phase {
                        Phase::Paginating { page } => page,
                        _ => 1,
                    };
                    if reloads >= self.settings.max_page_reloads {
                        return Err(ScrapeError::PageProcessing {
                            page: failed_page,
                            reason: e.to_string(),
                        });
                    }
                    reloads += 1;
                    warn!(phase = ?phase, page = failed_page, reloads, error = %e, "Results view failed, reloading");
                    page.reload().await?;
                    tokio::time::sleep(self.settings.reload_settle).await;
                    Phase::Start
                }
            };
        }

        let added = collected.len() - before;
        info!(chunk = %chunk, records = added, "Window finished");
        Ok(added)
    }

    async fn open_window(
        &self,
        page: &dyn PortalPage,
        window: &dyn WindowSetter,
        chunk: &DateChunk,
    ) -> Result<()> {
        window.point_at(page, chunk).await?;
        self.apply_filters(page).await
    }

    async fn apply_filters(&self, page: &dyn PortalPage) -> Result<()> {
        let filter = &self.settings.date_type_filter;
        if !ensure_checked(page, selectors::DATE_TYPE_LABEL, selectors::DATE_TYPE_RADIO, filter).await? {
            warn!(filter = %filter, "Date type filter not found");
        }
        for label in &self.settings.payment_filters {
            if !ensure_checked(
                page,
                selectors::PAYMENT_FILTER_LABEL,
                selectors::PAYMENT_FILTER_CHECKBOX,
                label,
            )
            .await?
            {
                warn!(filter = %label, "Payment filter not found");
            }
        }
        tokio::time::sleep(self.settings.step_settle).await;
        Ok(())
    }

    async fn submit(&self, page: &dyn PortalPage) -> Result<()> {
        let s = &self.settings;
        page.wait_for(selectors::APPLY_BUTTON, WaitCondition::Visible, s.element_timeout)
            .await?;
        page.click(selectors::APPLY_BUTTON).await?;

        if page
            .wait_for(selectors::LOADER, WaitCondition::Visible, s.step_settle)
            .await
            .is_err()
        {
            debug!("Loader did not appear");
        }
        page.wait_for(selectors::LOADER, WaitCondition::Hidden, s.element_timeout)
            .await?;
        page.wait_for(selectors::RESULTS_TABLE, WaitCondition::Visible, s.element_timeout)
            .await
    }

    /// Poll the row count until two consecutive non-zero readings agree.
    /// Returns the last reading; zero means the window is empty.
    async fn stabilize(&self, page: &dyn PortalPage) -> Result<usize> {
        let mut previous = 0;
        for poll in 1..=self.settings.stabilization_max_polls {
            tokio::time::sleep(self.settings.stabilization_interval).await;
            let count = page.count(selectors::GUEST_LINK).await?;
            debug!(poll, count, "Row count");
            if count == previous && count > 0 {
                debug!(count, "Row count stabilized");
                return Ok(count);
            }
            previous = count;
        }
        let last = page.count(selectors::GUEST_LINK).await?;
        if last > 0 {
            warn!(count = last, "Row count never stabilized, continuing");
        }
        Ok(last)
    }

    async fn set_page_size(&self, page: &dyn PortalPage) -> Result<()> {
        if page.count(selectors::PAGE_SIZE_SELECT).await? == 0 {
            debug!("No page size selector");
            return Ok(());
        }
        page.select_option(selectors::PAGE_SIZE_SELECT, &self.settings.page_size.to_string())
            .await?;
        tokio::time::sleep(self.settings.page_settle).await;
        page.wait_for(selectors::RESULT_ROWS, WaitCondition::Visible, self.settings.element_timeout)
            .await
    }

    async fn read_total(&self, page: &dyn PortalPage) -> Option<u32> {
        match page.read_text(selectors::RESULTS_SUMMARY).await {
            Ok(Some(label)) => parse_total_results(&label),
            _ => None,
        }
    }

    /// Record every unseen row on the current page. Returns whether a next
    /// page was opened.
    async fn process_page(
        &self,
        page: &dyn PortalPage,
        number: u32,
        collected: &mut RunRecords,
        total: Option<u32>,
    ) -> Result<bool> {
        info!(page = number, "Processing results page");
        page.wait_for(selectors::RESULT_ROWS, WaitCondition::Visible, self.settings.element_timeout)
            .await?;
        tokio::time::sleep(self.settings.page_settle).await;

        let html = page
            .inner_html(selectors::RESULTS_TABLE)
            .await?
            .ok_or_else(|| ScrapeError::ElementNotFound {
                selector: selectors::RESULTS_TABLE.into(),
            })?;

        for row in parse_rows(&html)? {
            if collected.contains(&row.reservation_id) {
                debug!(reservation_id = %row.reservation_id, "Already recorded, skipping");
                continue;
            }
            let id = row.reservation_id.clone();
            match self.extract_row(page, row).await {
                Ok(record) => {
                    collected.record(record);
                }
                Err(e) if e.is_row_level() => {
                    warn!(reservation_id = %id, error = %e, "Skipping row");
                }
                Err(e) => return Err(e),
            }
        }
        info!(page = number, processed = collected.len(), total = ?total, "Page done");

        let next_enabled = page
            .element_state(selectors::NEXT_PAGE_BUTTON, 0)
            .await?
            .is_some_and(|state| !state.disabled);
        if next_enabled {
            page.click(selectors::NEXT_PAGE_BUTTON).await?;
            tokio::time::sleep(self.settings.page_settle).await;
        }
        Ok(next_enabled)
    }

    async fn extract_row(&self, page: &dyn PortalPage, row: RowSummary) -> Result<ReservationRecord> {
        let s = &self.settings;
        debug!(reservation_id = %row.reservation_id, position = row.position, "Opening details");
        page.click_nth(selectors::GUEST_LINK, row.position).await?;

        if page
            .wait_for(selectors::DIALOG_CONTENT, WaitCondition::Visible, s.dialog_timeout)
            .await
            .is_err()
        {
            self.close_dialog(page).await;
            return Err(ScrapeError::DialogTimeout {
                reservation_id: row.reservation_id,
            });
        }
        tokio::time::sleep(s.dialog_settle).await;
        page.scroll_to_bottom(selectors::DIALOG_CONTENT).await?;
        tokio::time::sleep(s.dialog_settle).await;

        let content = with_retry(s.extraction, "dialog extraction", |_| read_dialog(page)).await;
        self.close_dialog(page).await;

        let record = match content {
            Ok(content) if content.cancelled => {
                debug!(reservation_id = %row.reservation_id, "Reservation cancelled");
                let mut record = ReservationRecord::from_summary(row, ReservationStatus::Cancelled);
                record.reason = content.reason;
                record
            }
            Ok(content) => {
                let mut record = ReservationRecord::from_summary(row, ReservationStatus::Confirmed);
                record.payment = content.payment;
                record.adjustment = content.adjustment;
                record.reason = content.reason;
                record
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                let exhausted = ScrapeError::ExtractionRetryExhausted {
                    reservation_id: row.reservation_id.clone(),
                    attempts: s.extraction.max_attempts,
                };
                warn!(error = %exhausted, "Recording placeholders");
                let mut record = ReservationRecord::from_summary(row, ReservationStatus::Confirmed);
                record.payment = PaymentDetails::Card(CardDetails::placeholder());
                record
            }
        };
        Ok(record)
    }

    async fn close_dialog(&self, page: &dyn PortalPage) {
        match page.click(selectors::DIALOG_CLOSE).await {
            Ok(()) => tokio::time::sleep(self.settings.dialog_close_settle).await,
            Err(e) => warn!(error = %e, "Could not close dialog"),
        }
    }
}

async fn read_dialog(page: &dyn PortalPage) -> Result<DialogContent> {
    let html = page
        .inner_html(selectors::DIALOG_CONTENT)
        .await?
        .unwrap_or_default();
    let content = parse_dialog(&html)?;
    if content.is_empty() {
        return Err(ScrapeError::Script {
            reason: "dialog payment fields are empty".into(),
        });
    }
    Ok(content)
}

/// Click the control whose label reads `label` unless it is already checked.
/// Returns `false` when no label matches.
async fn ensure_checked(
    page: &dyn PortalPage,
    label_selector: &str,
    input_selector: &str,
    label: &str,
) -> Result<bool> {
    let total = page.count(label_selector).await?;
    for index in 0..total {
        let Some(state) = page.element_state(label_selector, index).await? else {
            continue;
        };
        if !state.text.trim().eq_ignore_ascii_case(label.trim()) {
            continue;
        }
        let checked = page
            .element_state(input_selector, index)
            .await?
            .is_some_and(|input| input.checked);
        if checked {
            debug!(filter = label, "Filter already selected");
        } else {
            page.click_nth(input_selector, index).await?;
        }
        return Ok(true);
    }
    Ok(false)
}
