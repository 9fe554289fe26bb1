use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid date '{input}': {reason}")]
    Format { input: String, reason: String },

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidRange { start: String, end: String },

    #[error("Date picker control missing: {control}")]
    NavigationControlMissing { control: String },

    #[error("Day {day} is not selectable in the {panel} panel")]
    DayUnavailable { day: u32, panel: String },

    #[error(
        "Date picker shows {actual_from} - {actual_to}, expected {expected_from} - {expected_to}"
    )]
    ConfirmationMismatch {
        expected_from: String,
        expected_to: String,
        actual_from: String,
        actual_to: String,
    },

    #[error("Detail dialog did not open for reservation {reservation_id}")]
    DialogTimeout { reservation_id: String },

    #[error("Payment details for reservation {reservation_id} still empty after {attempts} attempts")]
    ExtractionRetryExhausted {
        reservation_id: String,
        attempts: u32,
    },

    #[error("Failed to process results page {page}: {reason}")]
    PageProcessing { page: u32, reason: String },

    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("Property not found: {name}")]
    PropertyNotFound { name: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Timed out after {timeout_ms}ms waiting for {selector}")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    #[error("Page script failed: {reason}")]
    Script { reason: String },

    #[error("Invalid session transition from {from} to {to}")]
    SessionState { from: String, to: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Run exceeded its {secs}s time limit")]
    RunTimeout { secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ScrapeError {
    /// Errors that end the whole run instead of a single row, page or chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::PropertyNotFound { .. }
                | Self::Browser(_)
                | Self::SessionState { .. }
                | Self::RunTimeout { .. }
        )
    }

    /// Row-level failures: the row is skipped or recorded with placeholders.
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            Self::DialogTimeout { .. } | Self::ExtractionRetryExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
