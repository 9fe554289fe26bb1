use std::path::PathBuf;

use serde::Serialize;

use crate::domain::dates::{DateEncoding, DateValue, normalize_date};
use crate::domain::reservation::ReservationRecord;
use crate::error::{Result, ScrapeError};

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Raw inbound trigger. Dates are month-first `MM/DD/YYYY`.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub credentials: Credentials,
    pub start_date: String,
    pub end_date: String,
    pub property_name: Option<String>,
}

/// A request whose fields have been checked and dates parsed.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub credentials: Credentials,
    pub start: DateValue,
    pub end: DateValue,
    pub property_name: Option<String>,
}

impl ScrapeRequest {
    pub fn validate(&self) -> Result<ValidatedRequest> {
        if self.credentials.email.trim().is_empty() {
            return Err(ScrapeError::InvalidRequest {
                reason: "email is required".into(),
            });
        }
        if self.credentials.password.is_empty() {
            return Err(ScrapeError::InvalidRequest {
                reason: "password is required".into(),
            });
        }

        let start = normalize_date(&self.start_date, DateEncoding::MonthFirst)?;
        let end = normalize_date(&self.end_date, DateEncoding::MonthFirst)?;
        if end < start {
            return Err(ScrapeError::InvalidRange {
                start: self.start_date.trim().to_string(),
                end: self.end_date.trim().to_string(),
            });
        }

        let property_name = self
            .property_name
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from);

        Ok(ValidatedRequest {
            credentials: Credentials {
                email: self.credentials.email.trim().to_string(),
                password: self.credentials.password.clone(),
            },
            start,
            end,
            property_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    pub chunk: String,
    pub reason: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub records: Vec<ReservationRecord>,
    pub failed_chunks: Vec<ChunkFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
}

impl ScrapeReport {
    pub fn is_partial(&self) -> bool {
        !self.failed_chunks.is_empty()
    }
}
