use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use mcp_expedia::adapters::browser::chromium::ChromiumLauncher;
use mcp_expedia::adapters::export::xlsx_report::XlsxReportExporter;
use mcp_expedia::adapters::mail::gmail::GmailPasscodeProvider;
use mcp_expedia::config::load_config;
use mcp_expedia::mcp::server::ReservationsMcpServer;
use mcp_expedia::portal::pipeline::ReservationPipeline;

fn find_config_path() -> PathBuf {
    let candidates = [PathBuf::from("config.yaml"), binary_dir().join("config.yaml")];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn binary_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting mcp-expedia server");

    let config_path = find_config_path();
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let launcher = Arc::new(ChromiumLauncher::new(&config.browser));
    let passcodes =
        Arc::new(GmailPasscodeProvider::new(&config.mail).context("building Gmail client")?);
    let exporter = Arc::new(XlsxReportExporter::new(&config.export));

    let chunk_span_days = config.portal.chunk_span_days;
    let pipeline = ReservationPipeline::new(config, launcher, passcodes, exporter);
    let server = ReservationsMcpServer::new(Arc::new(pipeline), chunk_span_days);

    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
