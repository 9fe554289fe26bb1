#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        let _ = mcp_expedia::portal::parsers::rows::parse_rows(html);
        let _ = mcp_expedia::portal::parsers::rows::parse_total_results(html);
    }
});
