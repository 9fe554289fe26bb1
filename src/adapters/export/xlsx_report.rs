use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::config::types::ExportConfig;
use crate::domain::reservation::{REPORT_COLUMNS, ReservationRecord};
use crate::error::Result;
use crate::ports::exporter::ReportExporter;

/// Name of the single worksheet in every report.
pub const SHEET_NAME: &str = "Reservations";

/// Writes one spreadsheet report per run into the configured directory.
pub struct XlsxReportExporter {
    output_dir: PathBuf,
    file_prefix: String,
}

impl XlsxReportExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            file_prefix: config.file_prefix.clone(),
        }
    }
}

/// `<prefix>_<RFC 3339 UTC with millis>.xlsx`, with `:` and `.` made filename-safe.
pub fn report_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{prefix}_{stamp}.xlsx")
}

/// One worksheet: a bold header row, then one row per record in report
/// column order. Every cell is written as text.
pub fn write_report(path: &Path, records: &[ReservationRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in (0u16..).zip(REPORT_COLUMNS) {
        sheet.write_string_with_format(0, col, title, &header)?;
    }
    for (row, record) in (1u32..).zip(records) {
        for (col, value) in (0u16..).zip(record.to_row()) {
            sheet.write_string(row, col, value)?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

#[async_trait]
impl ReportExporter for XlsxReportExporter {
    async fn export(&self, records: &[ReservationRecord]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(report_file_name(&self.file_prefix, Utc::now()));
        write_report(&path, records)?;
        info!(path = %path.display(), rows = records.len(), "Report exported");
        Ok(path)
    }
}
