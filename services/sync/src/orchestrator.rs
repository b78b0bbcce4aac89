use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use stechuhr_db::activity::models::{SourceSystem, UnifiedActivity};
use stechuhr_db::activity::repositories::ActivityRepository;
use stechuhr_db::sync_state::repositories::SyncStatusRepository;

use crate::mail::fetcher::MailFetcher;
use crate::telephony::fetcher::TelephonyFetcher;
use crate::warehouse::fetcher::WarehouseFetcher;

const SYNC_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: SourceSystem,
    pub success: bool,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub sources: Vec<SourceOutcome>,
}

impl SyncReport {
    pub fn total_count(&self) -> usize {
        self.sources.iter().map(|s| s.count).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.sources.iter().all(|s| s.success)
    }
}

/// Runs all three source fetchers concurrently and stamps the per-source
/// sync status exactly once per run. A failing source never blocks the
/// others, and `run_sync` itself never fails; every problem becomes a
/// `SourceOutcome` carrying the original error message.
pub struct Orchestrator<A, S> {
    activity_repo: A,
    sync_repo: S,
    mail: Option<MailFetcher>,
    warehouse: Option<WarehouseFetcher>,
    telephony: Option<TelephonyFetcher>,
}

impl<A, S> Orchestrator<A, S>
where
    A: ActivityRepository,
    S: SyncStatusRepository,
{
    pub fn new(
        activity_repo: A,
        sync_repo: S,
        mail: Option<MailFetcher>,
        warehouse: Option<WarehouseFetcher>,
        telephony: Option<TelephonyFetcher>,
    ) -> Self {
        Self {
            activity_repo,
            sync_repo,
            mail,
            warehouse,
            telephony,
        }
    }

    pub async fn run_sync(&self) -> SyncReport {
        let cutoff = Utc::now() - Duration::days(SYNC_WINDOW_DAYS);
        tracing::info!(%cutoff, "starting activity sync");

        let (mail, warehouse, telephony) = tokio::join!(
            self.sync_mail(cutoff),
            self.sync_warehouse(cutoff),
            self.sync_telephony(cutoff),
        );

        let report = SyncReport {
            sources: vec![mail, warehouse, telephony],
        };
        tracing::info!(
            total = report.total_count(),
            all_succeeded = report.all_succeeded(),
            "activity sync finished"
        );
        report
    }

    async fn sync_mail(&self, cutoff: DateTime<Utc>) -> SourceOutcome {
        let fetched = match &self.mail {
            Some(fetcher) => fetcher.fetch(cutoff).await.map_err(|e| e.to_string()),
            None => Err("not configured".to_string()),
        };
        self.finish(SourceSystem::Mail, fetched).await
    }

    async fn sync_warehouse(&self, cutoff: DateTime<Utc>) -> SourceOutcome {
        let fetched = match &self.warehouse {
            Some(fetcher) => fetcher.fetch(cutoff).await.map_err(|e| e.to_string()),
            None => Err("not configured".to_string()),
        };
        self.finish(SourceSystem::TicketWarehouse, fetched).await
    }

    async fn sync_telephony(&self, cutoff: DateTime<Utc>) -> SourceOutcome {
        let fetched = match &self.telephony {
            Some(fetcher) => fetcher.fetch(cutoff).await.map_err(|e| e.to_string()),
            None => Err("not configured".to_string()),
        };
        self.finish(SourceSystem::Telephony, fetched).await
    }

    /// Upsert a fetched batch (or record the failure) and stamp the source's
    /// sync status exactly once. An individual upsert failure is logged and
    /// skipped; the batch keeps going.
    async fn finish(
        &self,
        source: SourceSystem,
        fetched: Result<Vec<UnifiedActivity>, String>,
    ) -> SourceOutcome {
        match fetched {
            Ok(activities) => {
                let mut upserted = 0;
                for activity in activities {
                    let source_id = activity.source_id.clone();
                    match self.activity_repo.upsert(activity).await {
                        Ok(()) => upserted += 1,
                        Err(e) => {
                            tracing::warn!(
                                source = source.as_str(),
                                source_id = %source_id,
                                error = %e,
                                "failed to upsert activity, skipping"
                            );
                        }
                    }
                }

                if let Err(e) = self.sync_repo.mark_success(source).await {
                    tracing::error!(
                        source = source.as_str(),
                        error = %e,
                        "failed to stamp sync success"
                    );
                }

                SourceOutcome {
                    source,
                    success: true,
                    count: upserted,
                    message: format!("synced {upserted} activities"),
                }
            }
            Err(message) => {
                tracing::error!(source = source.as_str(), error = %message, "source sync failed");

                if let Err(e) = self.sync_repo.mark_failure(source, &message).await {
                    tracing::error!(
                        source = source.as_str(),
                        error = %e,
                        "failed to stamp sync failure"
                    );
                }

                SourceOutcome {
                    source,
                    success: false,
                    count: 0,
                    message,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use stechuhr_common::error::AppResult;
    use stechuhr_db::activity::models::ActivityFilter;
    use stechuhr_db::sync_state::models::SyncStatus;

    use crate::mail::client::{MailClient, MailClientConfig};
    use crate::telephony::client::{TelephonyClient, TelephonyClientConfig};

    // ── Mock ActivityRepository ─────────────────────────────────

    #[derive(Clone)]
    struct MockActivityRepo {
        rows: Arc<Mutex<HashMap<(SourceSystem, String), UnifiedActivity>>>,
        fail_ids: Vec<String>,
    }

    impl MockActivityRepo {
        fn new() -> Self {
            Self {
                rows: Arc::new(Mutex::new(HashMap::new())),
                fail_ids: Vec::new(),
            }
        }

        fn failing_on(ids: &[&str]) -> Self {
            Self {
                rows: Arc::new(Mutex::new(HashMap::new())),
                fail_ids: ids.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ActivityRepository for MockActivityRepo {
        async fn upsert(&self, activity: UnifiedActivity) -> AppResult<()> {
            if self.fail_ids.contains(&activity.source_id) {
                return Err(stechuhr_common::error::AppError::Database(
                    "constraint violation".to_string(),
                ));
            }
            self.rows
                .lock()
                .unwrap()
                .insert((activity.source_system, activity.source_id.clone()), activity);
            Ok(())
        }

        async fn list(&self, _filter: ActivityFilter) -> AppResult<Vec<UnifiedActivity>> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }
    }

    // ── Mock SyncStatusRepository ───────────────────────────────

    #[derive(Clone)]
    struct MockSyncRepo {
        marks: Arc<Mutex<Vec<(SourceSystem, Result<(), String>)>>>,
    }

    impl MockSyncRepo {
        fn new() -> Self {
            Self {
                marks: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn marks_for(&self, source: SourceSystem) -> Vec<Result<(), String>> {
            self.marks
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _)| *s == source)
                .map(|(_, r)| r.clone())
                .collect()
        }
    }

    #[async_trait]
    impl SyncStatusRepository for MockSyncRepo {
        async fn mark_success(&self, source: SourceSystem) -> AppResult<()> {
            self.marks.lock().unwrap().push((source, Ok(())));
            Ok(())
        }

        async fn mark_failure(&self, source: SourceSystem, error_message: &str) -> AppResult<()> {
            self.marks
                .lock()
                .unwrap()
                .push((source, Err(error_message.to_string())));
            Ok(())
        }

        async fn list(&self) -> AppResult<Vec<SyncStatus>> {
            Ok(Vec::new())
        }
    }

    // ── Fixtures ────────────────────────────────────────────────

    async fn mail_fetcher_against(server: &MockServer) -> MailFetcher {
        let config = MailClientConfig {
            base_url: "http://localhost".to_string(),
            api_token: "tok".to_string(),
            accounts: vec!["team@example.com".to_string()],
            max_retries: 0,
            timeout_secs: 5,
        };
        MailFetcher::new(
            MailClient::new(config).unwrap().with_base_url(&server.uri()),
        )
    }

    async fn telephony_fetcher_against(server: &MockServer) -> TelephonyFetcher {
        let config = TelephonyClientConfig {
            base_url: "http://localhost".to_string(),
            api_token: "tok".to_string(),
            allowed_numbers: vec!["4915735999713".to_string()],
            max_retries: 0,
            timeout_secs: 5,
        };
        TelephonyFetcher::new(
            TelephonyClient::new(config)
                .unwrap()
                .with_base_url(&server.uri()),
        )
    }

    async fn mount_mail_messages(server: &MockServer, ids: &[&str]) {
        let refs: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/accounts/team@example.com/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "messages": refs })),
            )
            .mount(server)
            .await;

        for id in ids {
            Mock::given(method("GET"))
                .and(path(format!("/accounts/team@example.com/messages/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": id,
                    "snippet": "Sehr geehrte Damen und Herren",
                    "payload": {
                        "headers": [
                            { "name": "Date", "value": "Tue, 14 Nov 2023 10:00:00 +0000" },
                            { "name": "Subject", "value": "Angebot" },
                            { "name": "To", "value": "kunde@example.com" }
                        ]
                    }
                })))
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn one_failing_source_does_not_block_the_others() {
        let mail_server = MockServer::start().await;
        mount_mail_messages(&mail_server, &["m-1", "m-2"]).await;

        let telephony_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calls"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&telephony_server)
            .await;

        let activity_repo = MockActivityRepo::new();
        let sync_repo = MockSyncRepo::new();

        let orchestrator = Orchestrator::new(
            activity_repo.clone(),
            sync_repo.clone(),
            Some(mail_fetcher_against(&mail_server).await),
            None,
            Some(telephony_fetcher_against(&telephony_server).await),
        );

        let report = orchestrator.run_sync().await;
        assert_eq!(report.sources.len(), 3);

        let mail = &report.sources[0];
        assert!(mail.success);
        assert_eq!(mail.count, 2);

        let warehouse = &report.sources[1];
        assert!(!warehouse.success);
        assert_eq!(warehouse.message, "not configured");

        let telephony = &report.sources[2];
        assert!(!telephony.success);
        assert!(telephony.message.contains("401"), "got: {}", telephony.message);

        assert_eq!(activity_repo.len(), 2);
    }

    #[tokio::test]
    async fn every_source_gets_exactly_one_status_stamp() {
        let mail_server = MockServer::start().await;
        mount_mail_messages(&mail_server, &["m-1"]).await;

        let sync_repo = MockSyncRepo::new();
        let orchestrator = Orchestrator::new(
            MockActivityRepo::new(),
            sync_repo.clone(),
            Some(mail_fetcher_against(&mail_server).await),
            None,
            None,
        );

        orchestrator.run_sync().await;

        for source in SourceSystem::ALL {
            assert_eq!(
                sync_repo.marks_for(source).len(),
                1,
                "expected one stamp for {}",
                source.as_str()
            );
        }
        assert!(sync_repo.marks_for(SourceSystem::Mail)[0].is_ok());
        assert_eq!(
            sync_repo.marks_for(SourceSystem::TicketWarehouse)[0],
            Err("not configured".to_string())
        );
    }

    #[tokio::test]
    async fn rerun_is_idempotent_for_unchanged_sources() {
        let mail_server = MockServer::start().await;
        mount_mail_messages(&mail_server, &["m-1", "m-2", "m-3"]).await;

        let activity_repo = MockActivityRepo::new();
        let orchestrator = Orchestrator::new(
            activity_repo.clone(),
            MockSyncRepo::new(),
            Some(mail_fetcher_against(&mail_server).await),
            None,
            None,
        );

        orchestrator.run_sync().await;
        assert_eq!(activity_repo.len(), 3);

        orchestrator.run_sync().await;
        assert_eq!(activity_repo.len(), 3);
    }

    #[tokio::test]
    async fn upsert_failures_are_skipped_and_the_batch_continues() {
        let mail_server = MockServer::start().await;
        mount_mail_messages(&mail_server, &["m-1", "m-2", "m-3"]).await;

        let activity_repo = MockActivityRepo::failing_on(&["m-2"]);
        let sync_repo = MockSyncRepo::new();
        let orchestrator = Orchestrator::new(
            activity_repo.clone(),
            sync_repo.clone(),
            Some(mail_fetcher_against(&mail_server).await),
            None,
            None,
        );

        let report = orchestrator.run_sync().await;
        let mail = &report.sources[0];
        assert!(mail.success);
        assert_eq!(mail.count, 2);
        assert_eq!(activity_repo.len(), 2);
        // A partial batch still counts as a successful run.
        assert!(sync_repo.marks_for(SourceSystem::Mail)[0].is_ok());
    }

    #[tokio::test]
    async fn fetch_failure_stamps_the_verbatim_message() {
        let mail_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/accounts/.*/messages$"))
            .respond_with(ResponseTemplate::new(403).set_body_string("token expired"))
            .mount(&mail_server)
            .await;

        let sync_repo = MockSyncRepo::new();
        let orchestrator = Orchestrator::new(
            MockActivityRepo::new(),
            sync_repo.clone(),
            Some(mail_fetcher_against(&mail_server).await),
            None,
            None,
        );

        let report = orchestrator.run_sync().await;
        let mail = &report.sources[0];
        assert!(!mail.success);

        let stamped = sync_repo.marks_for(SourceSystem::Mail)[0]
            .clone()
            .unwrap_err();
        assert_eq!(stamped, mail.message);
        assert!(stamped.contains("token expired"), "got: {stamped}");
    }
}
