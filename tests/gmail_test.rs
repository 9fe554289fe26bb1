use std::io::Write as _;
use std::time::Duration;

use mcp_expedia::adapters::mail::gmail::GmailPasscodeProvider;
use mcp_expedia::config::types::MailConfig;
use mcp_expedia::error::ScrapeError;
use mcp_expedia::ports::passcode::PasscodeProvider;

use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn token_file(access_token: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"access_token":"{access_token}","refresh_token":"r","token_type":"Bearer","expiry_date":1700000000000}}"#
    )
    .unwrap();
    file
}

fn mail_config(base_url: &str, token: &NamedTempFile) -> MailConfig {
    MailConfig {
        api_base_url: base_url.to_string(),
        token_path: token.path().display().to_string(),
        max_messages: 5,
        poll_interval_secs: 0,
        initial_delay_secs: 0,
        passcode_wait_secs: 0,
        request_timeout_secs: 5,
    }
}

async fn mount_list(server: &MockServer, ids: &[&str]) {
    let messages: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id, "threadId": id }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("maxResults", "5"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": messages,
            "resultSizeEstimate": ids.len(),
        })))
        .mount(server)
        .await;
}

async fn mount_message(server: &MockServer, id: &str, snippet: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/gmail/v1/users/me/messages/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": id,
            "snippet": snippet,
        })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn finds_passcode_in_newest_message() {
    let server = MockServer::start().await;
    mount_list(&server, &["m1", "m2"]).await;
    mount_message(&server, "m1", "Your Partner Central passcode is 583920").await;
    mount_message(&server, "m2", "Older code 111111").await;

    let token = token_file("test-token");
    let provider = GmailPasscodeProvider::new(&mail_config(&server.uri(), &token)).unwrap();

    provider.ensure_ready().await.unwrap();
    let code = provider.fetch_passcode(Duration::ZERO).await.unwrap();
    assert_eq!(code.as_deref(), Some("583920"));
}

#[tokio::test]
async fn skips_messages_without_code() {
    let server = MockServer::start().await;
    mount_list(&server, &["m1", "m2"]).await;
    mount_message(&server, "m1", "Weekly newsletter, room 42 upgrades").await;
    mount_message(&server, "m2", "Use 7654321 to sign in").await;

    let token = token_file("test-token");
    let provider = GmailPasscodeProvider::new(&mail_config(&server.uri(), &token)).unwrap();

    let code = provider.fetch_passcode(Duration::ZERO).await.unwrap();
    assert_eq!(code.as_deref(), Some("7654321"));
}

#[tokio::test]
async fn empty_inbox_returns_none_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultSizeEstimate": 0
        })))
        .mount(&server)
        .await;

    let token = token_file("test-token");
    let provider = GmailPasscodeProvider::new(&mail_config(&server.uri(), &token)).unwrap();

    let code = provider.fetch_passcode(Duration::ZERO).await.unwrap();
    assert!(code.is_none());
}

#[tokio::test]
async fn polls_until_code_arrives() {
    let server = MockServer::start().await;
    // first listing is empty, later ones carry the message
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_list(&server, &["m9"]).await;
    mount_message(&server, "m9", "Passcode: 246810").await;

    let token = token_file("test-token");
    let mut config = mail_config(&server.uri(), &token);
    config.poll_interval_secs = 1;
    let provider = GmailPasscodeProvider::new(&config).unwrap();

    let code = provider
        .fetch_passcode(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(code.as_deref(), Some("246810"));
}

#[tokio::test]
async fn transient_errors_are_retried_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_list(&server, &["m1"]).await;
    mount_message(&server, "m1", "Code 998877").await;

    let token = token_file("test-token");
    let mut config = mail_config(&server.uri(), &token);
    config.poll_interval_secs = 1;
    let provider = GmailPasscodeProvider::new(&config).unwrap();

    let code = provider
        .fetch_passcode(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(code.as_deref(), Some("998877"));
}

#[tokio::test]
async fn rejected_token_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let token = token_file("expired");
    let provider = GmailPasscodeProvider::new(&mail_config(&server.uri(), &token)).unwrap();

    let err = provider
        .fetch_passcode(Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Authentication { .. }));
    assert!(err.to_string().contains("Gmail authentication required"));
}

#[tokio::test]
async fn missing_token_is_not_ready() {
    let server = MockServer::start().await;
    let token = token_file("x");
    let mut config = mail_config(&server.uri(), &token);
    config.token_path = "/tmp/no_such_expedia_token_file_9931.json".into();
    let provider = GmailPasscodeProvider::new(&config).unwrap();

    let err = provider.ensure_ready().await.unwrap_err();
    assert!(matches!(err, ScrapeError::Authentication { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn blank_token_is_not_ready() {
    let server = MockServer::start().await;
    let token = token_file("   ");
    let provider = GmailPasscodeProvider::new(&mail_config(&server.uri(), &token)).unwrap();
    assert!(provider.ensure_ready().await.is_err());
}
