use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::domain::reservation::{Adjustment, CardDetails, PaymentDetails, PayoutSummary};
use crate::error::Result;
use crate::portal::parsers::{normalize_whitespace, selector};
use crate::portal::selectors;

static CANCELLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcancell?ed\b").expect("valid cancellation regex"));

const TOTAL_GUEST_PAYMENT: &str = "Total guest payment";
const EXPEDIA_COMPENSATION: &str = "Expedia compensation";
const TOTAL_PAYOUT: &str = "Total payout";
const AMOUNT_TO_CHARGE: &str = "Remaining amount to charge";
const AMOUNT_TO_REFUND: &str = "Amount to refund";
const REASON: &str = "Reason";

/// What one reservation detail dialog shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogContent {
    pub cancelled: bool,
    pub payment: PaymentDetails,
    pub adjustment: Adjustment,
    pub reason: Option<String>,
}

impl DialogContent {
    /// Nothing usable was rendered yet.
    pub fn is_empty(&self) -> bool {
        !self.cancelled && self.payment == PaymentDetails::None
    }
}

/// Parse the inner HTML of the detail dialog.
///
/// The reservation counts as cancelled only when a status badge or heading
/// says so. Card details come from their concealed fields; payout figures, the
/// adjustment and the reason are found by their label, taking the next text
/// node as the value.
pub fn parse_dialog(html: &str) -> Result<DialogContent> {
    let document = Html::parse_fragment(html);
    let tokens: Vec<String> = document
        .root_element()
        .text()
        .map(normalize_whitespace)
        .filter(|t| !t.is_empty())
        .collect();

    let status_sel = selector(selectors::DIALOG_STATUS)?;
    let cancelled = document
        .select(&status_sel)
        .any(|el| CANCELLED_RE.is_match(&normalize_whitespace(&el.text().collect::<String>())));

    let number_sel = selector(selectors::CARD_NUMBER)?;
    let secure_sel = selector(selectors::CARD_SECURE_CELLS)?;
    let number = document
        .select(&number_sel)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();
    let secure: Vec<String> = document
        .select(&secure_sel)
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .collect();

    let payment = if number.is_empty() {
        match (
            value_after(&tokens, TOTAL_GUEST_PAYMENT),
            value_after(&tokens, EXPEDIA_COMPENSATION),
            value_after(&tokens, TOTAL_PAYOUT),
        ) {
            (None, None, None) => PaymentDetails::None,
            (guest, compensation, payout) => PaymentDetails::Payout(PayoutSummary {
                total_guest_payment: guest.unwrap_or_default(),
                expedia_compensation: compensation.unwrap_or_default(),
                total_payout: payout.unwrap_or_default(),
            }),
        }
    } else {
        PaymentDetails::Card(CardDetails {
            number,
            expiry: secure.first().cloned().unwrap_or_default(),
            cvv: secure.get(1).cloned().unwrap_or_default(),
        })
    };

    let adjustment = if let Some(amount) = value_after(&tokens, AMOUNT_TO_CHARGE) {
        Adjustment::AmountToCharge(amount)
    } else if let Some(amount) = value_after(&tokens, AMOUNT_TO_REFUND) {
        Adjustment::AmountToRefund(amount)
    } else {
        Adjustment::None
    };

    Ok(DialogContent {
        cancelled,
        payment,
        adjustment,
        reason: value_after(&tokens, REASON),
    })
}

/// The token following the one equal to `label`, ignoring case and a
/// trailing colon.
fn value_after(tokens: &[String], label: &str) -> Option<String> {
    tokens
        .iter()
        .position(|t| t.trim_end_matches(':').eq_ignore_ascii_case(label))
        .and_then(|i| tokens.get(i + 1))
        .cloned()
}
