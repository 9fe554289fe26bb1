use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::domain::reservation::RowSummary;
use crate::error::Result;
use crate::portal::parsers::{first_text, selector};
use crate::portal::selectors;

static TOTAL_RESULTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"of\s+([\d,]+)\s+Results").expect("valid totals regex"));

/// Parse the inner HTML of the results table into row summaries.
///
/// Only rows carrying a guest link count; `position` is the row's index among
/// them, which is also the index of its link on the live page. Rows without a
/// reservation id are dropped.
pub fn parse_rows(table_html: &str) -> Result<Vec<RowSummary>> {
    let document = Html::parse_document(&format!("<table>{table_html}</table>"));
    let row_sel = selector("tbody tr")?;
    let link_sel = selector(selectors::GUEST_LINK)?;
    let guest_sel = selector(selectors::CELL_GUEST_NAME)?;
    let id_sel = selector(selectors::CELL_RESERVATION_ID)?;
    let conf_sel = selector(selectors::CELL_CONFIRMATION)?;
    let check_in_sel = selector(selectors::CELL_CHECK_IN)?;
    let check_out_sel = selector(selectors::CELL_CHECK_OUT)?;
    let room_sel = selector(selectors::CELL_ROOM_TYPE)?;
    let amount_sel = selector(selectors::CELL_BOOKING_AMOUNT)?;
    let booked_sel = selector(selectors::CELL_BOOKED_ON)?;

    let mut rows = Vec::new();
    let mut position = 0;
    for row in document.select(&row_sel) {
        if row.select(&link_sel).next().is_none() {
            continue;
        }
        let index = position;
        position += 1;

        let reservation_id = first_text(row, &id_sel);
        if reservation_id.is_empty() {
            tracing::debug!(position = index, "Row without reservation id, skipping");
            continue;
        }
        rows.push(RowSummary {
            position: index,
            reservation_id,
            guest_name: first_text(row, &guest_sel),
            confirmation_code: first_text(row, &conf_sel),
            check_in: first_text(row, &check_in_sel),
            check_out: first_text(row, &check_out_sel),
            room_type: first_text(row, &room_sel),
            booking_amount: first_text(row, &amount_sel),
            booked_date: first_text(row, &booked_sel),
        });
    }
    Ok(rows)
}

/// Total from a "Showing 1 - 100 of 245 Results" label.
pub fn parse_total_results(label: &str) -> Option<u32> {
    let caps = TOTAL_RESULTS_RE.captures(label)?;
    caps.get(1)?.as_str().replace(',', "").parse().ok()
}
