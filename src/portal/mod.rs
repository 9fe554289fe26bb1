//! Partner portal automation: login, property context, the date window
//! widget and the reservations table.

pub mod auth;
pub mod calendar;
pub mod orchestrator;
pub mod page_scraper;
pub mod parsers;
pub mod pipeline;
pub mod property;
pub mod retry;
pub mod selectors;
pub mod window;
