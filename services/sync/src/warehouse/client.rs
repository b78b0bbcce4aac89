use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::models::{QueryResponse, TicketRow};

#[derive(Debug, Clone)]
pub struct WarehouseClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub team_name: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl WarehouseClientConfig {
    /// Load warehouse config from environment.
    ///
    /// Returns `Ok(None)` if the warehouse is not configured (base URL /
    /// token missing). Returns `Err` if it IS configured but
    /// `WAREHOUSE_TEAM_NAME` is missing or blank.
    pub fn from_env() -> Result<Option<Self>, String> {
        let base_url = match std::env::var("WAREHOUSE_BASE_URL").ok() {
            Some(v) => v,
            None => return Ok(None),
        };
        let api_token = match std::env::var("WAREHOUSE_API_TOKEN").ok() {
            Some(v) => v,
            None => return Ok(None),
        };

        let team_name = std::env::var("WAREHOUSE_TEAM_NAME").map_err(|_| {
            "WAREHOUSE_TEAM_NAME is required when warehouse credentials are set, but not found"
                .to_string()
        })?;
        let team_name = team_name.trim().to_string();
        if team_name.is_empty() {
            return Err("WAREHOUSE_TEAM_NAME is set but blank".to_string());
        }

        let max_retries = std::env::var("WAREHOUSE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let timeout_secs = std::env::var("WAREHOUSE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Some(Self {
            base_url,
            api_token,
            team_name,
            max_retries,
            timeout_secs,
        }))
    }
}

#[derive(Clone)]
pub struct WarehouseClient {
    client: Client,
    config: WarehouseClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum WarehouseClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl WarehouseClient {
    pub fn new(config: WarehouseClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn team_name(&self) -> &str {
        &self.config.team_name
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    /// POST a SQL query against the warehouse's query endpoint, retrying
    /// transient errors.
    pub async fn query(&self, sql: &str) -> Result<Vec<TicketRow>, WarehouseClientError> {
        let url = format!("{}/query", self.config.base_url);
        let body = serde_json::json!({ "query": sql });
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                tracing::warn!(attempt, backoff_secs, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_token)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(WarehouseClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<QueryResponse>()
                    .await
                    .map(|r| r.rows)
                    .map_err(WarehouseClientError::RequestError);
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
            return Err(WarehouseClientError::HttpError { status, body });
        }

        Err(WarehouseClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}
