pub mod browser;
pub mod export;
pub mod mail;
