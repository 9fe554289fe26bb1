use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::types::MailConfig;
use crate::error::{Result, ScrapeError};
use crate::ports::passcode::PasscodeProvider;

static PASSCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{6,10}\b").expect("valid passcode regex"));

const AUTH_REQUIRED: &str = "Gmail authentication required";

/// First 6-10 digit number in a message snippet.
pub fn extract_passcode(snippet: &str) -> Option<String> {
    PASSCODE_RE.find(snippet).map(|m| m.as_str().to_string())
}

#[derive(Debug, Deserialize)]
struct StoredToken {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    snippet: String,
}

/// Reads the login passcode from the newest messages of a Gmail inbox.
///
/// The OAuth access token is read from `token_path` on every poll so an
/// external refresh is picked up mid-run.
pub struct GmailPasscodeProvider {
    http: Client,
    api_base: String,
    token_path: PathBuf,
    max_messages: u32,
    poll_interval: Duration,
}

impl GmailPasscodeProvider {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            token_path: PathBuf::from(&config.token_path),
            max_messages: config.max_messages,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        })
    }

    fn access_token(&self) -> Result<String> {
        let raw = std::fs::read_to_string(&self.token_path).map_err(|e| {
            debug!(path = %self.token_path.display(), error = %e, "Token file unreadable");
            ScrapeError::Authentication {
                reason: AUTH_REQUIRED.into(),
            }
        })?;
        let token: StoredToken = serde_json::from_str(&raw).map_err(|e| {
            debug!(error = %e, "Token file malformed");
            ScrapeError::Authentication {
                reason: AUTH_REQUIRED.into(),
            }
        })?;
        if token.access_token.trim().is_empty() {
            return Err(ScrapeError::Authentication {
                reason: AUTH_REQUIRED.into(),
            });
        }
        Ok(token.access_token)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, token: &str) -> Result<T> {
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ScrapeError::Authentication {
                reason: format!("{AUTH_REQUIRED} (mailbox returned HTTP {status})"),
            });
        }
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    /// One pass over the newest messages.
    async fn scan_inbox(&self) -> Result<Option<String>> {
        let token = self.access_token()?;
        let list_url = format!(
            "{}/gmail/v1/users/me/messages?maxResults={}",
            self.api_base, self.max_messages
        );
        let list: MessageList = self.get_json(&list_url, &token).await?;
        debug!(messages = list.messages.len(), "Inbox listed");

        for message in &list.messages {
            let url = format!("{}/gmail/v1/users/me/messages/{}", self.api_base, message.id);
            let detail: Message = self.get_json(&url, &token).await?;
            if let Some(code) = extract_passcode(&detail.snippet) {
                debug!(message_id = %message.id, "Passcode found");
                return Ok(Some(code));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl PasscodeProvider for GmailPasscodeProvider {
    async fn ensure_ready(&self) -> Result<()> {
        self.access_token().map(|_| ())
    }

    async fn fetch_passcode(&self, budget: Duration) -> Result<Option<String>> {
        let deadline = tokio::time::Instant::now() + budget;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.scan_inbox().await {
                Ok(Some(code)) => {
                    info!(attempt, "Passcode read from inbox");
                    return Ok(Some(code));
                }
                Ok(None) => debug!(attempt, "No passcode yet"),
                Err(e @ ScrapeError::Authentication { .. }) => return Err(e),
                Err(e) => warn!(attempt, error = %e, "Inbox poll failed"),
            }
            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
