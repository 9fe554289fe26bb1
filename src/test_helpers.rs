use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;

use crate::config::types::TimingConfig;
use crate::domain::reservation::{
    CardDetails, PaymentDetails, ReservationRecord, ReservationStatus, RowSummary,
};
use crate::domain::scrape_request::{ScrapeReport, ScrapeRequest};
use crate::error::{Result, ScrapeError};
use crate::ports::browser::BrowserLauncher;
use crate::ports::exporter::ReportExporter;
use crate::ports::page::{ElementState, PortalPage, WaitCondition};
use crate::ports::passcode::PasscodeProvider;
use crate::ports::reservation_source::ReservationSource;

/// Timing with every delay zeroed so flows run instantly under test.
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        keystroke_delay_ms: 0,
        step_settle_ms: 0,
        login_settle_ms: 0,
        nav_click_delay_ms: 0,
        confirm_settle_ms: 0,
        element_timeout_ms: 0,
        login_timeout_ms: 0,
        dialog_timeout_ms: 0,
        dialog_settle_ms: 0,
        dialog_close_settle_ms: 0,
        stabilization_interval_ms: 0,
        extraction_backoff_ms: 0,
        page_settle_ms: 0,
        reload_settle_ms: 0,
        ..TimingConfig::default()
    }
}

/// Queue of canned reads. Each read pops the front until one value is left,
/// which then sticks.
#[derive(Debug, Default, Clone)]
struct Script<T: Clone>(VecDeque<T>);

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<T> {
        if self.0.len() > 1 {
            self.0.pop_front()
        } else {
            self.0.front().cloned()
        }
    }

    fn peek(&self) -> Option<&T> {
        self.0.front()
    }
}

/// Mutable state behind a [`FakePage`]. Click hooks receive it to script how
/// the page reacts.
#[derive(Debug, Default)]
pub struct FakeDom {
    texts: HashMap<String, Script<String>>,
    values: HashMap<String, Script<String>>,
    html: HashMap<String, Script<String>>,
    counts: HashMap<String, Script<usize>>,
    states: HashMap<(String, usize), ElementState>,
    present: HashSet<String>,
    failing_clicks: HashSet<String>,
    failing_reads: HashSet<String>,
    url: String,
    pub clicks: Vec<(String, usize)>,
    pub typed: Vec<(String, String)>,
    pub selected: Vec<(String, String)>,
    pub visited: Vec<String>,
    pub reloads: usize,
    pub closes: usize,
    pub scrolls: usize,
}

impl FakeDom {
    pub fn set_text(&mut self, selector: &str, values: &[&str]) {
        self.texts.insert(
            selector.into(),
            Script(values.iter().map(|v| (*v).to_string()).collect()),
        );
    }

    pub fn set_value(&mut self, selector: &str, values: &[&str]) {
        self.values.insert(
            selector.into(),
            Script(values.iter().map(|v| (*v).to_string()).collect()),
        );
    }

    pub fn set_html(&mut self, selector: &str, values: &[&str]) {
        self.html.insert(
            selector.into(),
            Script(values.iter().map(|v| (*v).to_string()).collect()),
        );
    }

    pub fn set_count(&mut self, selector: &str, values: &[usize]) {
        self.counts
            .insert(selector.into(), Script(values.iter().copied().collect()));
    }

    pub fn set_state(&mut self, selector: &str, index: usize, state: ElementState) {
        self.states.insert((selector.into(), index), state);
    }

    pub fn show(&mut self, selector: &str) {
        self.present.insert(selector.into());
    }

    pub fn hide(&mut self, selector: &str) {
        self.present.remove(selector);
    }

    pub fn fail_clicks_on(&mut self, selector: &str) {
        self.failing_clicks.insert(selector.into());
    }

    pub fn allow_clicks_on(&mut self, selector: &str) {
        self.failing_clicks.remove(selector);
    }

    /// HTML reads of `selector` fail as if the browser connection dropped.
    pub fn fail_reads_on(&mut self, selector: &str) {
        self.failing_reads.insert(selector.into());
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.into();
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.clicks.iter().filter(|(s, _)| s == selector).count()
    }

    fn count_of(&mut self, selector: &str) -> usize {
        if let Some(script) = self.counts.get_mut(selector) {
            return script.next().unwrap_or(0);
        }
        self.current_count(selector)
    }

    fn current_count(&self, selector: &str) -> usize {
        if let Some(script) = self.counts.get(selector) {
            return script.peek().copied().unwrap_or(0);
        }
        let indexed = self
            .states
            .keys()
            .filter(|(s, _)| s == selector)
            .map(|(_, i)| i + 1)
            .max();
        indexed.unwrap_or_else(|| {
            usize::from(self.present.contains(selector) || self.texts.contains_key(selector))
        })
    }

    fn exists(&self, selector: &str, index: usize) -> bool {
        self.states.contains_key(&(selector.to_string(), index))
            || (index == 0 && self.present.contains(selector))
            || self.current_count(selector) > index
    }
}

type ClickHook = Box<dyn Fn(&mut FakeDom, usize) + Send + Sync>;
type ReloadHook = Box<dyn Fn(&mut FakeDom) + Send + Sync>;

/// Scriptable in-memory page that replays canned states.
pub struct FakePage {
    dom: Mutex<FakeDom>,
    hooks: Mutex<HashMap<String, Vec<ClickHook>>>,
    reload_hook: Mutex<Option<ReloadHook>>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            dom: Mutex::new(FakeDom::default()),
            hooks: Mutex::new(HashMap::new()),
            reload_hook: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_text(self, selector: &str, values: &[&str]) -> Self {
        self.dom.lock().unwrap().set_text(selector, values);
        self
    }

    #[must_use]
    pub fn with_value(self, selector: &str, values: &[&str]) -> Self {
        self.dom.lock().unwrap().set_value(selector, values);
        self
    }

    #[must_use]
    pub fn with_html(self, selector: &str, values: &[&str]) -> Self {
        self.dom.lock().unwrap().set_html(selector, values);
        self
    }

    #[must_use]
    pub fn with_count(self, selector: &str, values: &[usize]) -> Self {
        self.dom.lock().unwrap().set_count(selector, values);
        self
    }

    #[must_use]
    pub fn with_state(self, selector: &str, index: usize, state: ElementState) -> Self {
        self.dom.lock().unwrap().set_state(selector, index, state);
        self
    }

    #[must_use]
    pub fn with_present(self, selectors: &[&str]) -> Self {
        {
            let mut dom = self.dom.lock().unwrap();
            for s in selectors {
                dom.show(s);
            }
        }
        self
    }

    #[must_use]
    pub fn with_url(self, url: &str) -> Self {
        self.dom.lock().unwrap().set_url(url);
        self
    }

    #[must_use]
    pub fn on_click(
        self,
        selector: &str,
        hook: impl Fn(&mut FakeDom, usize) + Send + Sync + 'static,
    ) -> Self {
        self.hooks
            .lock()
            .unwrap()
            .entry(selector.into())
            .or_default()
            .push(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_reload(self, hook: impl Fn(&mut FakeDom) + Send + Sync + 'static) -> Self {
        *self.reload_hook.lock().unwrap() = Some(Box::new(hook));
        self
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeDom)) {
        f(&mut self.dom.lock().unwrap());
    }

    pub fn inspect<T>(&self, f: impl FnOnce(&FakeDom) -> T) -> T {
        f(&self.dom.lock().unwrap())
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.inspect(|d| d.clicks_on(selector))
    }

    pub fn clicked_indices(&self, selector: &str) -> Vec<usize> {
        self.inspect(|d| {
            d.clicks
                .iter()
                .filter(|(s, _)| s == selector)
                .map(|(_, i)| *i)
                .collect()
        })
    }

    pub fn typed_into(&self, selector: &str) -> Vec<String> {
        self.inspect(|d| {
            d.typed
                .iter()
                .filter(|(s, _)| s == selector)
                .map(|(_, t)| t.clone())
                .collect()
        })
    }

    pub fn close_count(&self) -> usize {
        self.inspect(|d| d.closes)
    }

    pub fn reload_count(&self) -> usize {
        self.inspect(|d| d.reloads)
    }
}

#[async_trait]
impl PortalPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut dom = self.dom.lock().unwrap();
        dom.visited.push(url.into());
        dom.url = url.into();
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut dom = self.dom.lock().unwrap();
        dom.reloads += 1;
        if let Some(hook) = self.reload_hook.lock().unwrap().as_ref() {
            hook(&mut dom);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.dom.lock().unwrap().url.clone())
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        Ok(self
            .dom
            .lock()
            .unwrap()
            .texts
            .get_mut(selector)
            .and_then(Script::next))
    }

    async fn read_value(&self, selector: &str) -> Result<Option<String>> {
        Ok(self
            .dom
            .lock()
            .unwrap()
            .values
            .get_mut(selector)
            .and_then(Script::next))
    }

    async fn inner_html(&self, selector: &str) -> Result<Option<String>> {
        let mut dom = self.dom.lock().unwrap();
        if dom.failing_reads.contains(selector) {
            return Err(ScrapeError::Browser(CdpError::NoResponse));
        }
        Ok(dom.html.get_mut(selector).and_then(Script::next))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.lock().unwrap().count_of(selector))
    }

    async fn element_state(&self, selector: &str, index: usize) -> Result<Option<ElementState>> {
        let dom = self.dom.lock().unwrap();
        Ok(dom.states.get(&(selector.to_string(), index)).cloned())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        let mut dom = self.dom.lock().unwrap();
        if dom.failing_clicks.contains(selector) || !dom.exists(selector, index) {
            return Err(ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        dom.clicks.push((selector.to_string(), index));
        let hooks = self.hooks.lock().unwrap();
        if let Some(list) = hooks.get(selector) {
            for hook in list {
                hook(&mut dom, index);
            }
        }
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let mut dom = self.dom.lock().unwrap();
        if !dom.exists(selector, 0) {
            return Err(ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        dom.selected.push((selector.into(), value.into()));
        Ok(())
    }

    async fn type_slowly(&self, selector: &str, text: &str, _per_char: Duration) -> Result<()> {
        let mut dom = self.dom.lock().unwrap();
        if !dom.exists(selector, 0) {
            return Err(ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        dom.typed.push((selector.into(), text.into()));
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<()> {
        let dom = self.dom.lock().unwrap();
        let shown = dom.exists(selector, 0);
        let satisfied = match condition {
            WaitCondition::Present | WaitCondition::Visible => shown,
            WaitCondition::Hidden => !shown,
        };
        if satisfied {
            Ok(())
        } else {
            Err(ScrapeError::WaitTimeout {
                selector: selector.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    async fn scroll_to_bottom(&self, _selector: &str) -> Result<()> {
        self.dom.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.dom.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Hands out one prepared page.
pub struct FakeLauncher {
    page: Arc<FakePage>,
    fail: bool,
    launches: Mutex<usize>,
}

impl FakeLauncher {
    pub fn new(page: Arc<FakePage>) -> Self {
        Self {
            page,
            fail: false,
            launches: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn launches(&self) -> usize {
        *self.launches.lock().unwrap()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn PortalPage>> {
        *self.launches.lock().unwrap() += 1;
        if self.fail {
            return Err(ScrapeError::Script {
                reason: "browser failed to start".into(),
            });
        }
        Ok(self.page.clone())
    }
}

type PasscodeFn = Box<dyn Fn() -> Result<Option<String>> + Send + Sync>;

pub struct MockPasscodeProvider {
    not_ready: Mutex<Option<String>>,
    fetch_fn: Mutex<PasscodeFn>,
    fetches: Mutex<usize>,
}

impl Default for MockPasscodeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPasscodeProvider {
    pub fn new() -> Self {
        Self {
            not_ready: Mutex::new(None),
            fetch_fn: Mutex::new(Box::new(|| Ok(Some("123456".into())))),
            fetches: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn with_passcode(self, f: impl Fn() -> Result<Option<String>> + Send + Sync + 'static) -> Self {
        *self.fetch_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn not_ready(self, reason: &str) -> Self {
        *self.not_ready.lock().unwrap() = Some(reason.into());
        self
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl PasscodeProvider for MockPasscodeProvider {
    async fn ensure_ready(&self) -> Result<()> {
        match self.not_ready.lock().unwrap().clone() {
            None => Ok(()),
            Some(reason) => Err(ScrapeError::Authentication { reason }),
        }
    }

    async fn fetch_passcode(&self, _budget: Duration) -> Result<Option<String>> {
        *self.fetches.lock().unwrap() += 1;
        let f = self.fetch_fn.lock().unwrap();
        f()
    }
}

/// Keeps every exported batch in memory.
#[derive(Default)]
pub struct RecordingExporter {
    batches: Mutex<Vec<Vec<ReservationRecord>>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<ReservationRecord>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportExporter for RecordingExporter {
    async fn export(&self, records: &[ReservationRecord]) -> Result<PathBuf> {
        let mut batches = self.batches.lock().unwrap();
        batches.push(records.to_vec());
        Ok(PathBuf::from(format!("reservations_test_{}.xlsx", batches.len())))
    }
}

type ScrapeFn = Box<dyn Fn(&ScrapeRequest) -> Result<ScrapeReport> + Send + Sync>;

pub struct MockReservationSource {
    scrape_fn: Mutex<ScrapeFn>,
}

impl Default for MockReservationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReservationSource {
    pub fn new() -> Self {
        Self {
            scrape_fn: Mutex::new(Box::new(|_| Ok(ScrapeReport::default()))),
        }
    }

    #[must_use]
    pub fn with_scrape(
        self,
        f: impl Fn(&ScrapeRequest) -> Result<ScrapeReport> + Send + Sync + 'static,
    ) -> Self {
        *self.scrape_fn.lock().unwrap() = Box::new(f);
        self
    }
}

#[async_trait]
impl ReservationSource for MockReservationSource {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeReport> {
        let f = self.scrape_fn.lock().unwrap();
        f(request)
    }
}

pub fn make_summary(id: &str, position: usize) -> RowSummary {
    RowSummary {
        position,
        reservation_id: id.into(),
        guest_name: format!("Guest {id}"),
        confirmation_code: format!("C{id}"),
        check_in: "Jan 5, 2024".into(),
        check_out: "Jan 6, 2024".into(),
        room_type: "Standard Double".into(),
        booking_amount: "100.00".into(),
        booked_date: "Dec 20, 2023".into(),
    }
}

pub fn make_record(id: &str) -> ReservationRecord {
    let mut record = ReservationRecord::from_summary(make_summary(id, 0), ReservationStatus::Confirmed);
    record.payment = PaymentDetails::Card(CardDetails {
        number: "4111 1111 1111 1111".into(),
        expiry: "12/27".into(),
        cvv: "123".into(),
    });
    record
}

/// A results table body in the portal's markup, one row per id.
pub fn make_rows_html(ids: &[&str]) -> String {
    let mut html = String::from("<thead><tr><th>Guest</th></tr></thead><tbody>");
    for id in ids {
        html.push_str(&format!(
            r#"<tr>
<td class="guestName"><button class="guestNameLink"><span class="fds-button2-label">Guest {id}</span></button></td>
<td class="reservationId"><div class="fds-cell">{id}</div></td>
<td class="confirmationCode"><label class="confirmationCodeLabel">C{id}</label></td>
<td class="checkInDate">Jan 5, 2024</td>
<td class="checkOutDate">Jan 6, 2024</td>
<td class="roomType">Standard Double</td>
<td class="bookingAmount"><span class="fds-currency-value">100.00</span></td>
<td class="bookedOnDate">Dec 20, 2023</td>
</tr>"#
        ));
    }
    html.push_str("</tbody>");
    html
}

/// Dialog markup carrying card details.
pub fn make_card_dialog_html(number: &str, expiry: &str, cvv: &str) -> String {
    format!(
        r#"<div class="fds-dialog-body">
<div class="cardDetails">
<div class="cardNumber replay-conceal"><bdi>{number}</bdi></div>
<div class="fds-cell all-cell-1-4 fds-type-color-primary replay-conceal">{expiry}</div>
<div class="fds-cell all-cell-1-4 fds-type-color-primary replay-conceal">{cvv}</div>
</div>
</div>"#
    )
}
