use tracing::{error, info, warn};

use crate::domain::chunk::DateChunk;
use crate::domain::dates::DateEncoding;
use crate::domain::scrape_request::{ChunkFailure, ScrapeReport};
use crate::domain::session::{ScrapeSession, SessionState};
use crate::error::Result;
use crate::portal::page_scraper::{ReservationPageScraper, RunRecords};
use crate::portal::window::WindowSetter;

/// Runs the page scraper over each chunk with one run-wide record set.
pub struct ChunkOrchestrator {
    scraper: ReservationPageScraper,
    window: Box<dyn WindowSetter>,
}

impl ChunkOrchestrator {
    pub fn new(scraper: ReservationPageScraper, window: Box<dyn WindowSetter>) -> Self {
        Self { scraper, window }
    }

    /// Chunks run in order. A chunk that fails with a non-fatal error is
    /// listed in `failed_chunks` and the run moves on; rows it extracted
    /// before failing are kept. Fatal errors end the run.
    pub async fn run(&self, session: &ScrapeSession, chunks: &[DateChunk]) -> Result<ScrapeReport> {
        session.require(SessionState::ReservationsLoaded)?;
        let page = session.page().as_ref();
        let mut collected = RunRecords::default();
        let mut failed_chunks = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            info!(chunk = %chunk, index = index + 1, of = chunks.len(), "Processing chunk");
            let before = collected.len();
            match self
                .scraper
                .scrape(page, self.window.as_ref(), chunk, &mut collected)
                .await
            {
                Ok(added) => info!(chunk = %chunk, records = added, "Chunk done"),
                Err(e) if e.is_fatal() => {
                    error!(chunk = %chunk, error = %e, "Chunk failed fatally");
                    return Err(e);
                }
                Err(e) => {
                    let kept = collected.len() - before;
                    warn!(chunk = %chunk, kept, error = %e, "Chunk failed, continuing");
                    failed_chunks.push(ChunkFailure {
                        chunk: chunk.label(DateEncoding::MonthFirst),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            records = collected.len(),
            failed_chunks = failed_chunks.len(),
            "All chunks processed"
        );
        Ok(ScrapeReport {
            records: collected.into_records(),
            failed_chunks,
            output_file: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::config::types::PortalConfig;
    use crate::domain::chunk::chunk;
    use crate::domain::dates::normalize_date;
    use crate::error::ScrapeError;
    use crate::portal::page_scraper::ScraperSettings;
    use crate::portal::selectors;
    use crate::ports::page::{ElementState, PortalPage};
    use crate::test_helpers::{FakePage, fast_timing, make_card_dialog_html, make_rows_html};

    /// Installs the results table scripted for each chunk label.
    struct ScriptedWindow {
        page: Arc<FakePage>,
        tables: HashMap<&'static str, Vec<&'static str>>,
        failing: HashMap<&'static str, fn() -> ScrapeError>,
        paged: HashSet<&'static str>,
    }

    impl ScriptedWindow {
        fn new(page: Arc<FakePage>, tables: &[(&'static str, Vec<&'static str>)]) -> Self {
            Self {
                page,
                tables: tables.iter().cloned().collect(),
                failing: HashMap::new(),
                paged: HashSet::new(),
            }
        }

        /// Every visit to `label` fails with `make()`.
        fn failing_for(mut self, label: &'static str, make: fn() -> ScrapeError) -> Self {
            self.failing.insert(label, make);
            self
        }

        /// `label` shows an enabled next-page button.
        fn paged(mut self, label: &'static str) -> Self {
            self.paged.insert(label);
            self
        }
    }

    #[async_trait]
    impl WindowSetter for ScriptedWindow {
        async fn point_at(&self, _page: &dyn PortalPage, chunk: &DateChunk) -> Result<()> {
            let label = chunk.label(DateEncoding::MonthFirst);
            if let Some(make) = self.failing.get(label.as_str()) {
                return Err(make());
            }
            let html = make_rows_html(self.tables.get(label.as_str()).map_or(&[][..], Vec::as_slice));
            let next_disabled = !self.paged.contains(label.as_str());
            self.page.update(|dom| {
                dom.set_html(selectors::RESULTS_TABLE, &[html.as_str()]);
                dom.set_state(
                    selectors::NEXT_PAGE_BUTTON,
                    0,
                    ElementState {
                        disabled: next_disabled,
                        ..ElementState::default()
                    },
                );
            });
            Ok(())
        }
    }

    fn loaded_session(page: Arc<FakePage>) -> ScrapeSession {
        let mut session = ScrapeSession::new(page);
        session
            .advance(SessionState::Authenticating {
                passcode_pending: false,
            })
            .unwrap();
        session.advance(SessionState::Authenticated).unwrap();
        session.advance(SessionState::ReservationsLoaded).unwrap();
        session
    }

    fn chunks(start: &str, end: &str) -> Vec<DateChunk> {
        chunk(
            &normalize_date(start, DateEncoding::MonthFirst).unwrap(),
            &normalize_date(end, DateEncoding::MonthFirst).unwrap(),
            2,
        )
        .unwrap()
    }

    fn results_view() -> Arc<FakePage> {
        Arc::new(
            FakePage::new()
                .with_present(&[
                    selectors::APPLY_BUTTON,
                    selectors::RESULTS_TABLE,
                    selectors::RESULT_ROWS,
                    selectors::DIALOG_CONTENT,
                    selectors::DIALOG_CLOSE,
                ])
                .with_count(selectors::GUEST_LINK, &[2])
                .with_html(
                    selectors::DIALOG_CONTENT,
                    &[make_card_dialog_html("4111", "12/27", "123").as_str()],
                ),
        )
    }

    fn orchestrator(window: ScriptedWindow) -> ChunkOrchestrator {
        ChunkOrchestrator::new(
            ReservationPageScraper::new(ScraperSettings::new(&PortalConfig::default(), &fast_timing())),
            Box::new(window),
        )
    }

    fn ids(report: &ScrapeReport) -> Vec<&str> {
        report.records.iter().map(|r| r.reservation_id.as_str()).collect()
    }

    const FIRST: &str = "01/01/2024 - 01/02/2024";
    const SECOND: &str = "01/03/2024 - 01/04/2024";
    const THIRD: &str = "01/05/2024 - 01/06/2024";

    #[tokio::test]
    async fn overlapping_windows_are_deduplicated() {
        let page = results_view();
        let session = loaded_session(page.clone());
        let window = ScriptedWindow::new(
            page.clone(),
            &[(FIRST, vec!["1", "2"]), (SECOND, vec!["2", "3"]), (THIRD, vec!["3", "1"])],
        );

        let report = orchestrator(window)
            .run(&session, &chunks("01/01/2024", "01/06/2024"))
            .await
            .unwrap();

        assert_eq!(ids(&report), vec!["1", "2", "3"]);
        let unique: HashSet<&str> = ids(&report).into_iter().collect();
        assert_eq!(unique.len(), report.records.len());
        assert!(report.failed_chunks.is_empty());
        // one dialog per reservation
        assert_eq!(page.clicks_on(selectors::GUEST_LINK), 3);
    }

    #[tokio::test]
    async fn failing_chunk_is_isolated() {
        let page = results_view();
        let session = loaded_session(page.clone());
        let window = ScriptedWindow::new(page, &[(FIRST, vec!["1"]), (THIRD, vec!["3"])])
            .failing_for(SECOND, || ScrapeError::ConfirmationMismatch {
                expected_from: "01/03/2024".into(),
                expected_to: "01/04/2024".into(),
                actual_from: "01/01/2024".into(),
                actual_to: "01/04/2024".into(),
            });

        let report = orchestrator(window)
            .run(&session, &chunks("01/01/2024", "01/06/2024"))
            .await
            .unwrap();

        assert_eq!(ids(&report), vec!["1", "3"]);
        assert_eq!(report.failed_chunks.len(), 1);
        assert_eq!(report.failed_chunks[0].chunk, SECOND);
        assert!(report.failed_chunks[0].reason.contains("01/03/2024"));
        assert!(report.is_partial());
    }

    #[tokio::test]
    async fn failed_chunk_keeps_rows_it_extracted() {
        let page = results_view();
        page.update(|dom| dom.fail_clicks_on(selectors::NEXT_PAGE_BUTTON));
        let session = loaded_session(page.clone());
        let window = ScriptedWindow::new(page.clone(), &[(FIRST, vec!["111"]), (SECOND, vec!["111", "222"])])
            .paged(FIRST);

        let report = orchestrator(window)
            .run(&session, &chunks("01/01/2024", "01/04/2024"))
            .await
            .unwrap();

        assert_eq!(ids(&report), vec!["111", "222"]);
        assert_eq!(report.failed_chunks.len(), 1);
        assert_eq!(report.failed_chunks[0].chunk, FIRST);
        // 111 opened once in the first window, 222 once in the second
        assert_eq!(page.clicks_on(selectors::GUEST_LINK), 2);
    }

    #[tokio::test]
    async fn fatal_error_stops_run() {
        let page = results_view();
        let session = loaded_session(page.clone());
        let window = ScriptedWindow::new(page, &[(SECOND, vec!["2"])]).failing_for(FIRST, || {
            ScrapeError::Authentication {
                reason: "session expired".into(),
            }
        });

        let err = orchestrator(window)
            .run(&session, &chunks("01/01/2024", "01/04/2024"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Authentication { .. }));
    }

    #[tokio::test]
    async fn requires_reservations_view() {
        let page = results_view();
        let session = ScrapeSession::new(page.clone());
        let window = ScriptedWindow::new(page, &[]);

        let err = orchestrator(window)
            .run(&session, &chunks("01/01/2024", "01/02/2024"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::SessionState { .. }));
    }

    #[tokio::test]
    async fn no_chunks_is_an_empty_report() {
        let page = results_view();
        let session = loaded_session(page.clone());
        let report = orchestrator(ScriptedWindow::new(page, &[]))
            .run(&session, &[])
            .await
            .unwrap();
        assert!(report.records.is_empty());
        assert!(!report.is_partial());
    }
}
