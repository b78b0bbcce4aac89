use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};

use super::models::{CallRecord, CallsPage};

const PER_PAGE: usize = 50;
const MAX_RECORDS: usize = 1000;

#[derive(Debug, Clone)]
pub struct TelephonyClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub allowed_numbers: Vec<String>,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl TelephonyClientConfig {
    /// Load telephony config from environment.
    ///
    /// Returns `Ok(None)` if telephony is not configured (base URL / token
    /// missing). Returns `Err` if it IS configured but
    /// `TELEPHONY_ALLOWED_NUMBERS` is missing or empty.
    pub fn from_env() -> Result<Option<Self>, String> {
        let base_url = match std::env::var("TELEPHONY_BASE_URL").ok() {
            Some(v) => v,
            None => return Ok(None),
        };
        let api_token = match std::env::var("TELEPHONY_API_TOKEN").ok() {
            Some(v) => v,
            None => return Ok(None),
        };

        let allowed_numbers = parse_csv_numbers("TELEPHONY_ALLOWED_NUMBERS")?;

        let max_retries = std::env::var("TELEPHONY_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let timeout_secs = std::env::var("TELEPHONY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Some(Self {
            base_url,
            api_token,
            allowed_numbers,
            max_retries,
            timeout_secs,
        }))
    }
}

/// Parse a comma-separated allow-list of phone numbers from an env var.
/// Returns `Err` if the var is missing or all entries are blank.
pub fn parse_csv_numbers(env_key: &str) -> Result<Vec<String>, String> {
    let raw = std::env::var(env_key).map_err(|_| {
        format!("{env_key} is required when telephony credentials are set, but not found")
    })?;

    let numbers: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if numbers.is_empty() {
        return Err(format!("{env_key} is set but contains no valid numbers"));
    }

    Ok(numbers)
}

#[derive(Clone)]
pub struct TelephonyClient {
    client: Client,
    config: TelephonyClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum TelephonyClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl TelephonyClient {
    pub fn new(config: TelephonyClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn allowed_numbers(&self) -> &[String] {
        &self.config.allowed_numbers
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    /// Fetch calls newest-first, following pages until a page comes back
    /// short, the cutoff is crossed, or the record safety cap is hit.
    pub async fn fetch_calls_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<CallRecord>, TelephonyClientError> {
        let mut calls = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!(
                "{}/calls?per_page={}&page={}",
                self.config.base_url, PER_PAGE, page
            );
            let body: CallsPage = self.get_with_retry(&url).await?;
            let page_len = body.calls.len();

            let mut crossed_cutoff = false;
            for call in body.calls {
                if call.started_at < cutoff.timestamp() {
                    crossed_cutoff = true;
                    break;
                }
                calls.push(call);
            }

            if crossed_cutoff || page_len < PER_PAGE || calls.len() >= MAX_RECORDS {
                break;
            }
            page += 1;
        }

        calls.truncate(MAX_RECORDS);
        Ok(calls)
    }

    async fn get_with_retry(&self, url: &str) -> Result<CallsPage, TelephonyClientError> {
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
                    return Err(TelephonyClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<CallsPage>()
                    .await
                    .map_err(TelephonyClientError::RequestError);
            }

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

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyClientError::HttpError { status, body });
        }

        Err(TelephonyClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}
