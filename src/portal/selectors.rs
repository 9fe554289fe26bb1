//! CSS selectors for the partner portal's markup.

// Login
pub const EMAIL_INPUT: &str = "#emailControl";
pub const CONTINUE_BUTTON: &str = "#continueButton";
pub const PASSWORD_INPUT: &str = "#passwordControl";
pub const SIGN_IN_BUTTON: &str = "#signInButton";
pub const PASSCODE_INPUT: &str = r#"input[name="passcode-input"]"#;
pub const PASSCODE_SUBMIT: &str = r#"button[data-testid="passcode-submit-button"]"#;
pub const LANDING_TABLE: &str = ".fds-data-table-wrapper";

// Property search and side drawer
pub const PROPERTY_SEARCH_INPUT: &str = ".all-properties__search input.fds-field-input";
pub const PROPERTY_RESULT_ROWS: &str = "tbody tr";
pub const PROPERTY_LINK: &str = r#".property-cell__property-name a[href*="/lodging/home/home"]"#;
pub const DRAWER_CONTENT: &str = ".uitk-drawer-content";
pub const DRAWER_ITEM_TEXT: &str = ".uitk-action-list-item-content .uitk-text.overflow-wrap";
pub const DRAWER_ITEM_LINK: &str = ".uitk-action-list-item-content a.uitk-action-list-item-link";

// Filters
pub const DATE_TYPE_RADIO: &str = r#"input[type="radio"][name="dateTypeFilter"]"#;
pub const DATE_TYPE_LABEL: &str = r#"input[type="radio"][name="dateTypeFilter"] ~ .fds-switch-label"#;
pub const PAYMENT_FILTER_CHECKBOX: &str = r#"input[type="checkbox"][name="paymentTypeFilter"]"#;
pub const PAYMENT_FILTER_LABEL: &str =
    r#"input[type="checkbox"][name="paymentTypeFilter"] ~ .fds-switch-label"#;
pub const APPLY_BUTTON: &str = ".fds-cell.all-cell-1-4 button.fds-button2.primary";
pub const LOADER: &str = "td .fds-loader.is-loading.is-visible";

// Date picker
pub const FROM_INPUT: &str = ".from-input-label input.fds-field-input";
pub const TO_INPUT: &str = ".to-input-label input.fds-field-input";
pub const FIRST_MONTH_HEADER: &str = ".first-month h2";
pub const SECOND_MONTH_HEADER: &str = ".second-month h2";
pub const NAV_BUTTONS: &str = ".fds-datepicker-navigation button";
pub const FIRST_MONTH_DAYS: &str = ".first-month .fds-datepicker-day";
pub const SECOND_MONTH_DAYS: &str = ".second-month .fds-datepicker-day";
pub const DONE_BUTTON: &str = ".fds-dropdown-footer button";

// Results table
pub const RESULTS_TABLE: &str = "table.fds-data-table";
pub const RESULT_ROWS: &str = "table.fds-data-table tbody tr";
pub const GUEST_LINK: &str = "td.guestName button.guestNameLink";
pub const PAGE_SIZE_SELECT: &str = ".fds-pagination-selector select";
pub const RESULTS_SUMMARY: &str = ".fds-pagination-showing-result";
pub const NEXT_PAGE_BUTTON: &str = ".fds-pagination-button.next button";

// Row cells, relative to a `tr`
pub const CELL_GUEST_NAME: &str = "td.guestName button.guestNameLink span.fds-button2-label";
pub const CELL_RESERVATION_ID: &str = "td.reservationId div.fds-cell";
pub const CELL_CONFIRMATION: &str = "td.confirmationCode label.confirmationCodeLabel";
pub const CELL_CHECK_IN: &str = "td.checkInDate";
pub const CELL_CHECK_OUT: &str = "td.checkOutDate";
pub const CELL_ROOM_TYPE: &str = "td.roomType";
pub const CELL_BOOKING_AMOUNT: &str = "td.bookingAmount .fds-currency-value";
pub const CELL_BOOKED_ON: &str = "td.bookedOnDate";

// Reservation detail dialog
pub const DIALOG_CONTENT: &str = ".fds-dialog-content";
pub const DIALOG_CLOSE: &str = ".fds-dialog-header button.dialog-close";
/// Elements whose text carries the reservation status inside the dialog.
pub const DIALOG_STATUS: &str = "[class*='status'], [class*='badge'], h1, h2";
pub const CARD_NUMBER: &str = ".cardNumber.replay-conceal bdi";
pub const CARD_SECURE_CELLS: &str =
    ".cardDetails .fds-cell.all-cell-1-4.fds-type-color-primary.replay-conceal";
