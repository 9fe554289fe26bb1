pub mod chunk;
pub mod dates;
pub mod reservation;
pub mod scrape_request;
pub mod session;
