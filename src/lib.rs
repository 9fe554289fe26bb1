pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod mcp;
pub mod portal;
pub mod ports;

#[cfg(test)]
pub mod test_helpers;
