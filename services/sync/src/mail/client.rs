use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::models::{MailMessage, MessageListPage, MessageRef};

const PAGE_SIZE: usize = 100;
const MAX_MESSAGES: usize = 1000;

#[derive(Debug, Clone)]
pub struct MailClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub accounts: Vec<String>,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl MailClientConfig {
    /// Load mail config from environment.
    ///
    /// Returns `Ok(None)` if mail is not configured (base URL / token missing).
    /// Returns `Err` if mail IS configured but `MAIL_ACCOUNTS` is missing or
    /// empty (fail-fast on misconfiguration).
    pub fn from_env() -> Result<Option<Self>, String> {
        let base_url = match std::env::var("MAIL_API_BASE_URL").ok() {
            Some(v) => v,
            None => return Ok(None),
        };
        let api_token = match std::env::var("MAIL_API_TOKEN").ok() {
            Some(v) => v,
            None => return Ok(None),
        };

        let accounts = parse_csv_accounts("MAIL_ACCOUNTS")?;

        let max_retries = std::env::var("MAIL_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let timeout_secs = std::env::var("MAIL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Some(Self {
            base_url,
            api_token,
            accounts,
            max_retries,
            timeout_secs,
        }))
    }
}

/// Parse a comma-separated list of mailbox addresses from an env var.
/// Returns `Err` if the var is missing or all entries are blank after trimming.
pub fn parse_csv_accounts(env_key: &str) -> Result<Vec<String>, String> {
    let raw = std::env::var(env_key).map_err(|_| {
        format!("{env_key} is required when mail credentials are set, but not found")
    })?;

    let accounts: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if accounts.is_empty() {
        return Err(format!("{env_key} is set but contains no valid accounts"));
    }

    Ok(accounts)
}

#[derive(Clone)]
pub struct MailClient {
    client: Client,
    config: MailClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum MailClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl MailClient {
    pub fn new(config: MailClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn accounts(&self) -> &[String] {
        &self.config.accounts
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    /// List ids of sent messages newer than `cutoff`, following `pageToken`
    /// until the mailbox is exhausted or `MAX_MESSAGES` ids are collected.
    /// Every id yields a per-message fetch later, so the cap bounds the
    /// total request volume per run.
    pub async fn list_sent_message_ids(
        &self,
        account: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, MailClientError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/accounts/{}/messages?label=SENT&after={}&maxResults={}",
                self.config.base_url,
                account,
                cutoff.timestamp(),
                PAGE_SIZE
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={token}"));
            }

            let page: MessageListPage = self.get_with_retry(&url).await?;
            ids.extend(page.messages.into_iter().map(|MessageRef { id }| id));

            if ids.len() >= MAX_MESSAGES {
                tracing::warn!(account, cap = MAX_MESSAGES, "message cap reached, stopping pagination");
                break;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        ids.truncate(MAX_MESSAGES);
        Ok(ids)
    }

    pub async fn fetch_message(
        &self,
        account: &str,
        id: &str,
    ) -> Result<MailMessage, MailClientError> {
        let url = format!(
            "{}/accounts/{}/messages/{}",
            self.config.base_url, account, id
        );
        self.get_with_retry(&url).await
    }

    async fn get_with_retry<T: DeserializeOwned>(&self, url: &str) -> Result<T, MailClientError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                tracing::warn!(attempt, backoff_secs, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            let response = match self
                .client
                .get(url)
                .bearer_auth(&self.config.api_token)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(MailClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(MailClientError::RequestError);
            }

            // Honor Retry-After header for 429
            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, "rate-limited, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            // Retry on 5xx
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            // Fail fast on 4xx (except 429 handled above)
            let body = response.text().await.unwrap_or_default();
            return Err(MailClientError::HttpError { status, body });
        }

        Err(MailClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> MailClientConfig {
        MailClientConfig {
            base_url: "http://localhost".to_string(),
            api_token: "fake-token".to_string(),
            accounts: vec!["team@example.com".to_string()],
            max_retries: 2,
            timeout_secs: 5,
        }
    }

    fn make_refs(count: usize, offset: usize) -> Vec<serde_json::Value> {
        (0..count)
            .map(|i| serde_json::json!({ "id": format!("msg-{}", i + offset) }))
            .collect()
    }

    #[tokio::test]
    async fn lists_single_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .and(query_param("maxResults", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "messages": make_refs(3, 0) })),
            )
            .mount(&server)
            .await;

        let client = MailClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let ids = client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap();
        assert_eq!(ids, vec!["msg-0", "msg-1", "msg-2"]);
    }

    #[tokio::test]
    async fn follows_page_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .and(query_param("pageToken", "tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "messages": make_refs(2, 100) })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": make_refs(100, 0),
                "nextPageToken": "tok-1"
            })))
            .mount(&server)
            .await;

        let client = MailClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let ids = client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap();
        assert_eq!(ids.len(), 102);
        assert_eq!(ids[100], "msg-100");
    }

    #[tokio::test]
    async fn stops_paging_at_message_cap() {
        let server = MockServer::start().await;

        // Every page carries a token, so only the cap ends the loop.
        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": make_refs(100, 0),
                "nextPageToken": "tok-again"
            })))
            .expect(10)
            .mount(&server)
            .await;

        let client = MailClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let ids = client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap();
        assert_eq!(ids.len(), MAX_MESSAGES);
    }

    #[tokio::test]
    async fn retries_on_500() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "messages": make_refs(1, 0) })),
            )
            .mount(&server)
            .await;

        let client = MailClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let ids = client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn fails_fast_on_401() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let client = MailClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let err = client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap_err();
        match err {
            MailClientError::HttpError { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("expected HttpError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn max_retries_exceeded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("always failing"))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.max_retries = 1;
        let client = MailClient::new(config)
            .unwrap()
            .with_base_url(&server.uri());

        let err = client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, MailClientError::MaxRetriesExceeded { .. }));
    }

    #[tokio::test]
    async fn uses_bearer_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer fake-token",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = MailClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        client
            .list_sent_message_ids("team@example.com", Utc::now())
            .await
            .unwrap();
    }

    // ── CSV parser tests ─────────────────────────────────────────

    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn parse_csv_trims_and_lowercases() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("_TEST_ACCOUNTS", " Team@Example.com , info@example.com ");
        let accounts = super::parse_csv_accounts("_TEST_ACCOUNTS").unwrap();
        assert_eq!(accounts, vec!["team@example.com", "info@example.com"]);
        std::env::remove_var("_TEST_ACCOUNTS");
    }

    #[test]
    fn parse_csv_blank_value_fails() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("_TEST_ACCOUNTS2", " , ,");
        let err = super::parse_csv_accounts("_TEST_ACCOUNTS2").unwrap_err();
        assert!(err.contains("no valid accounts"), "got: {err}");
        std::env::remove_var("_TEST_ACCOUNTS2");
    }

    #[test]
    fn from_env_returns_none_without_credentials() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MAIL_API_BASE_URL");
        std::env::remove_var("MAIL_API_TOKEN");
        std::env::remove_var("MAIL_ACCOUNTS");
        let result = MailClientConfig::from_env().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn from_env_fails_when_configured_without_accounts() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("MAIL_API_BASE_URL", "https://mail.example.com");
        std::env::set_var("MAIL_API_TOKEN", "tok");
        std::env::remove_var("MAIL_ACCOUNTS");
        let err = MailClientConfig::from_env().unwrap_err();
        assert!(err.contains("MAIL_ACCOUNTS"), "got: {err}");
        std::env::remove_var("MAIL_API_BASE_URL");
        std::env::remove_var("MAIL_API_TOKEN");
    }
}
