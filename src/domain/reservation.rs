use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

/// Column order of the exported report.
pub const REPORT_COLUMNS: [&str; 19] = [
    "Guest Name",
    "Reservation ID",
    "Confirmation Code",
    "Check-In",
    "Check-Out",
    "Room Type",
    "Booking Amount",
    "Booked Date",
    "Card Number",
    "Expiry Date",
    "CVV",
    "Has Card Info",
    "Has Payment Info",
    "Total Guest Payment",
    "Expedia Compensation",
    "Total Payout",
    "Amount To Charge/Refund",
    "Reason",
    "Status",
];

/// Summary fields read from one results-table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSummary {
    /// Index of the row's guest link among all guest links on the page.
    pub position: usize,
    pub reservation_id: String,
    pub guest_name: String,
    pub confirmation_code: String,
    pub check_in: String,
    pub check_out: String,
    pub room_type: String,
    pub booking_amount: String,
    pub booked_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    pub fn placeholder() -> Self {
        Self {
            number: NOT_AVAILABLE.into(),
            expiry: NOT_AVAILABLE.into(),
            cvv: NOT_AVAILABLE.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.number == NOT_AVAILABLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSummary {
    pub total_guest_payment: String,
    pub expedia_compensation: String,
    pub total_payout: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentDetails {
    Card(CardDetails),
    Payout(PayoutSummary),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Adjustment {
    AmountToCharge(String),
    AmountToRefund(String),
    None,
}

impl Adjustment {
    /// Report cell: the amount prefixed with its kind, e.g. `Refund: $20.00`.
    pub fn report_cell(&self) -> String {
        match self {
            Self::AmountToCharge(a) => format!("Charge: {a}"),
            Self::AmountToRefund(a) => format!("Refund: {a}"),
            Self::None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Everything extracted for one reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub reservation_id: String,
    pub guest_name: String,
    pub confirmation_code: String,
    pub check_in: String,
    pub check_out: String,
    pub room_type: String,
    pub booking_amount: String,
    pub booked_date: String,
    pub payment: PaymentDetails,
    pub adjustment: Adjustment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: ReservationStatus,
}

impl ReservationRecord {
    pub fn from_summary(summary: RowSummary, status: ReservationStatus) -> Self {
        Self {
            reservation_id: summary.reservation_id,
            guest_name: summary.guest_name,
            confirmation_code: summary.confirmation_code,
            check_in: summary.check_in,
            check_out: summary.check_out,
            room_type: summary.room_type,
            booking_amount: summary.booking_amount,
            booked_date: summary.booked_date,
            payment: PaymentDetails::None,
            adjustment: Adjustment::None,
            reason: None,
            status,
        }
    }

    pub fn has_card_info(&self) -> bool {
        matches!(&self.payment, PaymentDetails::Card(card) if !card.is_placeholder())
    }

    pub fn has_payment_info(&self) -> bool {
        matches!(self.payment, PaymentDetails::Payout(_))
    }

    /// Cells in [`REPORT_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        let (number, expiry, cvv) = match &self.payment {
            PaymentDetails::Card(card) => (
                card.number.clone(),
                card.expiry.clone(),
                card.cvv.clone(),
            ),
            _ => (String::new(), String::new(), String::new()),
        };
        let (guest_payment, compensation, payout) = match &self.payment {
            PaymentDetails::Payout(p) => (
                p.total_guest_payment.clone(),
                p.expedia_compensation.clone(),
                p.total_payout.clone(),
            ),
            _ => (String::new(), String::new(), String::new()),
        };
        let yes_no = |b: bool| if b { "Yes" } else { "No" }.to_string();

        vec![
            self.guest_name.clone(),
            self.reservation_id.clone(),
            self.confirmation_code.clone(),
            self.check_in.clone(),
            self.check_out.clone(),
            self.room_type.clone(),
            self.booking_amount.clone(),
            self.booked_date.clone(),
            number,
            expiry,
            cvv,
            yes_no(self.has_card_info()),
            yes_no(self.has_payment_info()),
            guest_payment,
            compensation,
            payout,
            self.adjustment.report_cell(),
            self.reason.clone().unwrap_or_default(),
            self.status.to_string(),
        ]
    }
}
