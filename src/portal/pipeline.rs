use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::types::{Config, WindowMode};
use crate::domain::chunk::{DateChunk, chunk};
use crate::domain::scrape_request::{ScrapeReport, ScrapeRequest, ValidatedRequest};
use crate::domain::session::ScrapeSession;
use crate::error::{Result, ScrapeError};
use crate::portal::auth::SessionAuthenticator;
use crate::portal::calendar::CalendarNavigator;
use crate::portal::orchestrator::ChunkOrchestrator;
use crate::portal::page_scraper::{ReservationPageScraper, ScraperSettings};
use crate::portal::property::PropertyLocator;
use crate::portal::window::{UrlWindow, WindowSetter};
use crate::ports::browser::BrowserLauncher;
use crate::ports::exporter::ReportExporter;
use crate::ports::passcode::PasscodeProvider;
use crate::ports::reservation_source::ReservationSource;

/// One complete export run: login, property, every chunk, one report file.
pub struct ReservationPipeline {
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
    passcodes: Arc<dyn PasscodeProvider>,
    exporter: Arc<dyn ReportExporter>,
}

impl ReservationPipeline {
    pub fn new(
        config: Config,
        launcher: Arc<dyn BrowserLauncher>,
        passcodes: Arc<dyn PasscodeProvider>,
        exporter: Arc<dyn ReportExporter>,
    ) -> Self {
        Self {
            config,
            launcher,
            passcodes,
            exporter,
        }
    }

    pub fn plan(&self, request: &ValidatedRequest) -> Result<Vec<DateChunk>> {
        chunk(&request.start, &request.end, self.config.portal.chunk_span_days)
    }

    fn window(&self) -> Box<dyn WindowSetter> {
        let portal = &self.config.portal;
        let timing = &self.config.timing;
        match portal.window_mode {
            WindowMode::DatePicker => Box::new(CalendarNavigator::new(portal, timing)),
            WindowMode::UrlRewrite => Box::new(UrlWindow::new(portal, timing)),
        }
    }

    async fn drive(
        &self,
        session: &mut ScrapeSession,
        request: &ValidatedRequest,
        chunks: &[DateChunk],
    ) -> Result<ScrapeReport> {
        let Config {
            portal,
            timing,
            mail,
            ..
        } = &self.config;

        SessionAuthenticator::new(portal, timing, mail)
            .authenticate(session, &request.credentials, self.passcodes.as_ref())
            .await?;

        let locator = PropertyLocator::new(timing);
        if let Some(name) = &request.property_name {
            locator.select_property(session, name).await?;
        }
        locator.open_reservations(session).await?;

        let orchestrator = ChunkOrchestrator::new(
            ReservationPageScraper::new(ScraperSettings::new(portal, timing)),
            self.window(),
        );
        orchestrator.run(session, chunks).await
    }
}

#[async_trait]
impl ReservationSource for ReservationPipeline {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeReport> {
        let request = request.validate()?;
        let chunks = self.plan(&request)?;
        info!(
            start = %request.start,
            end = %request.end,
            chunks = chunks.len(),
            property = ?request.property_name,
            "Starting reservation export"
        );

        self.passcodes.ensure_ready().await?;
        let page = self.launcher.launch().await?;
        let mut session = ScrapeSession::new(page);

        let budget = self.config.timing.run_timeout();
        let outcome = match tokio::time::timeout(budget, self.drive(&mut session, &request, &chunks)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ScrapeError::RunTimeout {
                secs: budget.as_secs(),
            }),
        };
        session.close().await;

        let mut report = outcome.inspect_err(|e| error!(error = %e, "Export run failed"))?;
        if report.is_partial() {
            warn!(failed = report.failed_chunks.len(), "Some chunks failed");
        }
        let path = self.exporter.export(&report.records).await?;
        info!(records = report.records.len(), file = %path.display(), "Report written");
        report.output_file = Some(path);
        Ok(report)
    }
}
