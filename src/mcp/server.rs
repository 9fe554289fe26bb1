use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ResourceTemplate, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router,
};

use crate::domain::chunk::chunk;
use crate::domain::dates::{DateEncoding, normalize_date};
use crate::domain::reservation::ReservationRecord;
use crate::domain::scrape_request::{ChunkFailure, Credentials, ScrapeReport, ScrapeRequest};
use crate::ports::reservation_source::ReservationSource;

// ---------- Run summaries ----------

/// Summaries of finished runs, exposed as `expedia://runs/{n}` resources.
/// Reservation rows and card data are not kept.
#[derive(Clone, Default)]
pub struct RunStore {
    entries: Arc<RwLock<BTreeMap<u32, RunEntry>>>,
}

#[derive(Clone)]
struct RunEntry {
    name: String,
    text: String,
}

impl RunStore {
    async fn insert(&self, name: String, text: String) -> String {
        let mut entries = self.entries.write().await;
        let id = entries.keys().next_back().map_or(1, |last| last + 1);
        entries.insert(id, RunEntry { name, text });
        run_uri(id)
    }

    async fn get(&self, uri: &str) -> Option<RunEntry> {
        let id = uri.strip_prefix(RUN_URI_PREFIX)?.parse().ok()?;
        self.entries.read().await.get(&id).cloned()
    }

    async fn list(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(id, entry)| (run_uri(*id), entry.name.clone()))
            .collect()
    }
}

impl std::fmt::Debug for RunStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStore").finish()
    }
}

const RUN_URI_PREFIX: &str = "expedia://runs/";

fn run_uri(id: u32) -> String {
    format!("{RUN_URI_PREFIX}{id}")
}

// ---------- Tool parameter types ----------

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ScrapeToolParams {
    /// Partner Central login email
    pub email: String,
    /// Partner Central password
    pub password: String,
    /// First day of the range, MM/DD/YYYY (e.g. "01/01/2024")
    pub start_date: String,
    /// Last day of the range, inclusive, MM/DD/YYYY
    pub end_date: String,
    /// Property to select after login. Omit for single-property accounts.
    pub property_name: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct PlanToolParams {
    /// First day of the range, MM/DD/YYYY
    pub start_date: String,
    /// Last day of the range, inclusive, MM/DD/YYYY
    pub end_date: String,
    /// Days per chunk (default: the configured chunk span)
    pub span_days: Option<u32>,
}

// ---------- Response envelopes ----------

#[derive(Debug, Serialize)]
pub struct ScrapeEnvelope {
    pub success: bool,
    pub message: String,
    pub record_count: usize,
    pub output_file: Option<String>,
    pub failed_chunks: Vec<ChunkFailure>,
    pub records: Vec<ReservationRecord>,
}

impl ScrapeEnvelope {
    fn completed(report: ScrapeReport) -> Self {
        let message = if report.is_partial() {
            format!(
                "Exported {} reservations; {} date windows failed",
                report.records.len(),
                report.failed_chunks.len()
            )
        } else {
            format!("Exported {} reservations", report.records.len())
        };
        Self {
            success: true,
            message,
            record_count: report.records.len(),
            output_file: report.output_file.map(|p| p.display().to_string()),
            failed_chunks: report.failed_chunks,
            records: report.records,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            record_count: 0,
            output_file: None,
            failed_chunks: Vec::new(),
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    start_date: &'a str,
    end_date: &'a str,
    property_name: Option<&'a str>,
    record_count: usize,
    output_file: Option<&'a str>,
    failed_chunks: &'a [ChunkFailure],
}

#[derive(Debug, Serialize)]
struct ChunkPlan {
    span_days: u32,
    chunk_count: usize,
    chunks: Vec<String>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

// ---------- Server ----------

#[derive(Clone)]
pub struct ReservationsMcpServer {
    source: Arc<dyn ReservationSource>,
    chunk_span_days: u32,
    tool_router: ToolRouter<Self>,
    runs: RunStore,
}

#[tool_router]
impl ReservationsMcpServer {
    pub fn new(source: Arc<dyn ReservationSource>, chunk_span_days: u32) -> Self {
        Self {
            source,
            chunk_span_days,
            tool_router: Self::tool_router(),
            runs: RunStore::default(),
        }
    }

    /// Log into Partner Central and export every reservation in a date range.
    #[tool(
        name = "expedia_scrape_reservations",
        description = "Log into Expedia Partner Central, walk the reservations table for every day between start_date and end_date (MM/DD/YYYY, inclusive) and export guest, payment and adjustment details to a one-sheet .xlsx report. Returns a JSON envelope with success, message, record_count, output_file, failed_chunks and records. Runs can take several minutes.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn expedia_scrape_reservations(
        &self,
        Parameters(params): Parameters<ScrapeToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = ScrapeRequest {
            credentials: Credentials {
                email: params.email,
                password: params.password,
            },
            start_date: params.start_date,
            end_date: params.end_date,
            property_name: params.property_name,
        };

        match self.source.scrape(&request).await {
            Ok(report) => {
                let envelope = ScrapeEnvelope::completed(report);
                let summary = RunSummary {
                    start_date: &request.start_date,
                    end_date: &request.end_date,
                    property_name: request.property_name.as_deref(),
                    record_count: envelope.record_count,
                    output_file: envelope.output_file.as_deref(),
                    failed_chunks: &envelope.failed_chunks,
                };
                let name = format!("Reservations {} - {}", request.start_date, request.end_date);
                let uri = self.runs.insert(name, to_json(&summary)).await;
                tracing::info!(uri = %uri, records = envelope.record_count, "Run recorded");
                Ok(CallToolResult::success(vec![Content::text(to_json(&envelope))]))
            }
            Err(e) => {
                tracing::error!(error = %e, "Reservation export failed");
                let envelope = ScrapeEnvelope::failed(format!("Reservation export failed: {e}"));
                Ok(CallToolResult::error(vec![Content::text(to_json(&envelope))]))
            }
        }
    }

    /// Preview how a date range is split into windows, without a browser.
    #[tool(
        name = "expedia_plan_chunks",
        description = "Split a date range (MM/DD/YYYY, inclusive) into the date windows expedia_scrape_reservations would query, without logging in. Useful to preview how long a run will take.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn expedia_plan_chunks(
        &self,
        Parameters(params): Parameters<PlanToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let span_days = params.span_days.unwrap_or(self.chunk_span_days);
        let planned = normalize_date(&params.start_date, DateEncoding::MonthFirst)
            .and_then(|start| {
                let end = normalize_date(&params.end_date, DateEncoding::MonthFirst)?;
                chunk(&start, &end, span_days)
            });

        match planned {
            Ok(chunks) => {
                let plan = ChunkPlan {
                    span_days,
                    chunk_count: chunks.len(),
                    chunks: chunks
                        .iter()
                        .map(|c| c.label(DateEncoding::MonthFirst))
                        .collect(),
                };
                Ok(CallToolResult::success(vec![Content::text(to_json(&plan))]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Could not plan date windows: {e}. Dates must be MM/DD/YYYY and the end must not precede the start."
            ))])),
        }
    }
}

#[tool_handler]
impl ServerHandler for ReservationsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Expedia Partner Central reservation exporter.\n\
                 \n\
                 ## Tools\n\
                 - expedia_scrape_reservations: log in (the verification passcode is read from the \
                 configured mailbox), open the reservations view and export every reservation in the \
                 date range to an .xlsx spreadsheet\n\
                 - expedia_plan_chunks: preview the date windows a run will query\n\
                 \n\
                 ## Resources\n\
                 Each finished export is summarized under expedia://runs/{n} (counts, output file, \
                 failed windows). Reservation rows are only returned by the tool call itself.\n\
                 \n\
                 ## Tips\n\
                 - Dates are MM/DD/YYYY and the range is inclusive.\n\
                 - A run that reports failed_chunks still exported every other window; rerun just \
                 the failed ranges."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources: Vec<Resource> = self
            .runs
            .list()
            .await
            .into_iter()
            .map(|(uri, name)| Resource {
                annotations: None,
                raw: RawResource {
                    uri,
                    name,
                    title: None,
                    description: None,
                    mime_type: Some("application/json".into()),
                    size: None,
                    icons: None,
                    meta: None,
                },
            })
            .collect();
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            resource_templates: vec![ResourceTemplate {
                annotations: None,
                raw: RawResourceTemplate {
                    uri_template: "expedia://runs/{n}".into(),
                    name: "Export Run".into(),
                    title: Some("Reservation export summary".into()),
                    description: Some(
                        "Counts, output file and failed date windows of one run (from expedia_scrape_reservations)"
                            .into(),
                    ),
                    mime_type: Some("application/json".into()),
                    icons: None,
                },
            }],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match self.runs.get(&request.uri).await {
            Some(entry) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(entry.text, request.uri)],
            }),
            None => Err(McpError::resource_not_found(
                format!("resource not found: {}", request.uri),
                None,
            )),
        }
    }
}
