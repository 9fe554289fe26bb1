pub mod browser;
pub mod exporter;
pub mod page;
pub mod passcode;
pub mod reservation_source;
