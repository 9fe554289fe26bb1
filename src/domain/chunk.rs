use serde::Serialize;

use crate::domain::dates::{DateEncoding, DateValue, to_display_string};
use crate::error::{Result, ScrapeError};

/// One bounded sub-interval of a requested range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateChunk {
    start: DateValue,
    end: DateValue,
}

impl DateChunk {
    pub fn new(start: DateValue, end: DateValue) -> Result<Self> {
        if end < start {
            return Err(ScrapeError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> &DateValue {
        &self.start
    }

    pub fn end(&self) -> &DateValue {
        &self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn span_days(&self) -> i64 {
        self.start.days_until(&self.end) + 1
    }

    pub fn contains(&self, date: &DateValue) -> bool {
        self.start <= *date && *date <= self.end
    }

    /// `start - end` rendered in the given encoding, zero padded.
    pub fn label(&self, encoding: DateEncoding) -> String {
        format!(
            "{} - {}",
            to_display_string(&self.start, encoding, true),
            to_display_string(&self.end, encoding, true)
        )
    }
}

impl std::fmt::Display for DateChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Split `[start, end]` into consecutive chunks of at most `span_days` days.
///
/// Every day of the range lands in exactly one chunk; the last chunk may be
/// shorter.
pub fn chunk(start: &DateValue, end: &DateValue, span_days: u32) -> Result<Vec<DateChunk>> {
    if span_days == 0 {
        return Err(ScrapeError::InvalidRequest {
            reason: "chunk span must be at least one day".into(),
        });
    }
    if end < start {
        return Err(ScrapeError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let step = i64::from(span_days) - 1;
    let mut chunks = Vec::new();
    let mut cursor = *start;
    loop {
        let chunk_end = match cursor.plus_days(step) {
            Some(candidate) if candidate < *end => candidate,
            _ => *end,
        };
        chunks.push(DateChunk {
            start: cursor,
            end: chunk_end,
        });
        if chunk_end >= *end {
            break;
        }
        match chunk_end.plus_days(1) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Ok(chunks)
}
