use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Source of the one-time login passcode.
#[async_trait]
pub trait PasscodeProvider: Send + Sync {
    /// Fail before a run starts when the provider cannot possibly deliver.
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// A 6-10 digit code, or `None` once `budget` is spent without finding one.
    async fn fetch_passcode(&self, budget: Duration) -> Result<Option<String>>;
}
