pub mod types;

use std::path::Path;

use crate::error::{Result, ScrapeError};
use types::Config;

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ScrapeError::Config(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    let config: Config = serde_yml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.portal.chunk_span_days == 0 {
        return Err(ScrapeError::Config(
            "portal.chunk_span_days must be at least 1".into(),
        ));
    }
    let nav = config.portal.navigation;
    if nav.previous_index == nav.next_index {
        return Err(ScrapeError::Config(format!(
            "portal.navigation uses index {} for both previous and next",
            nav.previous_index
        )));
    }
    if config.timing.extraction_attempts == 0 {
        return Err(ScrapeError::Config(
            "timing.extraction_attempts must be at least 1".into(),
        ));
    }
    Ok(())
}
