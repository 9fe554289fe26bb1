use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::dates::DateEncoding;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// How each chunk's date window is applied to the reservations view.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Drive the date-picker widget.
    DatePicker,
    /// Rewrite the window's query parameters on the current URL and reload.
    UrlRewrite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default)]
    pub navigation: NavigationButtons,
    /// Encoding the portal uses to render the from/to inputs.
    #[serde(default = "default_display_encoding")]
    pub display_encoding: DateEncoding,
    #[serde(default = "default_chunk_span_days")]
    pub chunk_span_days: u32,
    #[serde(default = "default_window_mode")]
    pub window_mode: WindowMode,
    #[serde(default = "default_start_param")]
    pub url_start_param: String,
    #[serde(default = "default_end_param")]
    pub url_end_param: String,
    #[serde(default = "default_date_type_filter")]
    pub date_type_filter: String,
    /// Payment-method filter labels, e.g. "Collect payments", "Virtual card".
    #[serde(default)]
    pub payment_filters: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Positions of the previous/next controls inside the picker's navigation bar.
///
/// Revisions of the portal have swapped these, so they are configuration and
/// checked by the ignored live test rather than assumed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct NavigationButtons {
    #[serde(default = "default_previous_index")]
    pub previous_index: usize,
    #[serde(default = "default_next_index")]
    pub next_index: usize,
}

impl Default for NavigationButtons {
    fn default() -> Self {
        Self {
            previous_index: default_previous_index(),
            next_index: default_next_index(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            navigation: NavigationButtons::default(),
            display_encoding: default_display_encoding(),
            chunk_span_days: default_chunk_span_days(),
            window_mode: default_window_mode(),
            url_start_param: default_start_param(),
            url_end_param: default_end_param(),
            date_type_filter: default_date_type_filter(),
            payment_filters: Vec::new(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary; looked up on PATH when unset.
    #[serde(default)]
    pub chrome_executable: Option<String>,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_browser_args")]
    pub args: Vec<String>,
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: true,
            args: default_browser_args(),
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}

/// Delays, wait budgets and retry bounds for the portal interaction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    #[serde(default = "default_keystroke_ms")]
    pub keystroke_delay_ms: u64,
    #[serde(default = "default_step_settle_ms")]
    pub step_settle_ms: u64,
    #[serde(default = "default_login_settle_ms")]
    pub login_settle_ms: u64,
    #[serde(default = "default_nav_click_ms")]
    pub nav_click_delay_ms: u64,
    #[serde(default = "default_confirm_settle_ms")]
    pub confirm_settle_ms: u64,
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,
    #[serde(default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,
    #[serde(default = "default_dialog_timeout_ms")]
    pub dialog_timeout_ms: u64,
    #[serde(default = "default_dialog_settle_ms")]
    pub dialog_settle_ms: u64,
    #[serde(default = "default_dialog_close_ms")]
    pub dialog_close_settle_ms: u64,
    #[serde(default = "default_stabilization_interval_ms")]
    pub stabilization_interval_ms: u64,
    #[serde(default = "default_stabilization_polls")]
    pub stabilization_max_polls: u32,
    #[serde(default = "default_extraction_attempts")]
    pub extraction_attempts: u32,
    #[serde(default = "default_extraction_backoff_ms")]
    pub extraction_backoff_ms: u64,
    #[serde(default = "default_page_settle_ms")]
    pub page_settle_ms: u64,
    #[serde(default = "default_max_page_reloads")]
    pub max_page_reloads: u32,
    #[serde(default = "default_reload_settle_ms")]
    pub reload_settle_ms: u64,
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

impl TimingConfig {
    pub fn keystroke(&self) -> Duration {
        Duration::from_millis(self.keystroke_delay_ms)
    }

    pub fn step_settle(&self) -> Duration {
        Duration::from_millis(self.step_settle_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            keystroke_delay_ms: default_keystroke_ms(),
            step_settle_ms: default_step_settle_ms(),
            login_settle_ms: default_login_settle_ms(),
            nav_click_delay_ms: default_nav_click_ms(),
            confirm_settle_ms: default_confirm_settle_ms(),
            element_timeout_ms: default_element_timeout_ms(),
            login_timeout_ms: default_login_timeout_ms(),
            dialog_timeout_ms: default_dialog_timeout_ms(),
            dialog_settle_ms: default_dialog_settle_ms(),
            dialog_close_settle_ms: default_dialog_close_ms(),
            stabilization_interval_ms: default_stabilization_interval_ms(),
            stabilization_max_polls: default_stabilization_polls(),
            extraction_attempts: default_extraction_attempts(),
            extraction_backoff_ms: default_extraction_backoff_ms(),
            page_settle_ms: default_page_settle_ms(),
            max_page_reloads: default_max_page_reloads(),
            reload_settle_ms: default_reload_settle_ms(),
            run_timeout_secs: default_run_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    #[serde(default = "default_gmail_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Pause after the passcode page appears, before the inbox is first read.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_passcode_budget")]
    pub passcode_wait_secs: u64,
    #[serde(default = "default_mail_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_gmail_api_base(),
            token_path: default_token_path(),
            max_messages: default_max_messages(),
            poll_interval_secs: default_poll_interval(),
            initial_delay_secs: default_initial_delay(),
            passcode_wait_secs: default_passcode_budget(),
            request_timeout_secs: default_mail_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_login_url() -> String {
    "https://www.expediapartnercentral.com/Account/Logon?signedOff=true".into()
}

fn default_previous_index() -> usize {
    0
}

fn default_next_index() -> usize {
    1
}

fn default_display_encoding() -> DateEncoding {
    DateEncoding::DayFirst
}

fn default_chunk_span_days() -> u32 {
    2
}

fn default_window_mode() -> WindowMode {
    WindowMode::DatePicker
}

fn default_start_param() -> String {
    "startDate".into()
}

fn default_end_param() -> String {
    "endDate".into()
}

fn default_date_type_filter() -> String {
    "Checking out".into()
}

fn default_page_size() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_browser_args() -> Vec<String> {
    vec![
        "--no-sandbox".into(),
        "--disable-setuid-sandbox".into(),
        "--disable-blink-features=AutomationControlled".into(),
        "--no-first-run".into(),
        "--no-default-browser-check".into(),
    ]
}

fn default_navigation_timeout() -> u64 {
    60
}

fn default_keystroke_ms() -> u64 {
    100
}

fn default_step_settle_ms() -> u64 {
    1000
}

fn default_login_settle_ms() -> u64 {
    4000
}

fn default_nav_click_ms() -> u64 {
    200
}

fn default_confirm_settle_ms() -> u64 {
    2000
}

fn default_element_timeout_ms() -> u64 {
    30_000
}

fn default_login_timeout_ms() -> u64 {
    60_000
}

fn default_dialog_timeout_ms() -> u64 {
    8000
}

fn default_dialog_settle_ms() -> u64 {
    2000
}

fn default_dialog_close_ms() -> u64 {
    1500
}

fn default_stabilization_interval_ms() -> u64 {
    2000
}

fn default_stabilization_polls() -> u32 {
    15
}

fn default_extraction_attempts() -> u32 {
    3
}

fn default_extraction_backoff_ms() -> u64 {
    1000
}

fn default_page_settle_ms() -> u64 {
    2000
}

fn default_max_page_reloads() -> u32 {
    3
}

fn default_reload_settle_ms() -> u64 {
    5000
}

fn default_run_timeout() -> u64 {
    3600
}

fn default_gmail_api_base() -> String {
    "https://gmail.googleapis.com".into()
}

fn default_token_path() -> String {
    "token.json".into()
}

fn default_max_messages() -> u32 {
    5
}

fn default_poll_interval() -> u64 {
    5
}

fn default_initial_delay() -> u64 {
    15
}

fn default_passcode_budget() -> u64 {
    60
}

fn default_mail_timeout() -> u64 {
    30
}

fn default_output_dir() -> String {
    ".".into()
}

fn default_file_prefix() -> String {
    "reservations".into()
}
