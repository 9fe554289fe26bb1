#![no_main]
use libfuzzer_sys::fuzz_target;
use mcp_expedia::domain::dates::{DateEncoding, normalize_date, parse_month_header};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = normalize_date(raw, DateEncoding::DayFirst);
        let _ = normalize_date(raw, DateEncoding::MonthFirst);
        let _ = parse_month_header(raw);
    }
});
