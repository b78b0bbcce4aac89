mod activities;
mod changes;
mod error;
mod notifications;
mod session;
mod timesheet;
mod worktime;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use stechuhr_config::{init_tracing, AppConfig};
use stechuhr_db::activity::pg_repository::PgActivityRepository;
use stechuhr_db::change_request::pg_repository::PgChangeRequestRepository;
use stechuhr_db::notification::pg_repository::PgNotificationRepository;
use stechuhr_db::sync_state::pg_repository::PgSyncStatusRepository;
use stechuhr_db::timesheet::pg_repository::PgTimesheetRepository;
use stechuhr_db::user::pg_repository::PgUserRepository;
use stechuhr_db::work_rule::pg_repository::PgWorkRuleRepository;
use stechuhr_sync::mail::client::{MailClient, MailClientConfig};
use stechuhr_sync::mail::fetcher::MailFetcher;
use stechuhr_sync::telephony::client::{TelephonyClient, TelephonyClientConfig};
use stechuhr_sync::telephony::fetcher::TelephonyFetcher;
use stechuhr_sync::warehouse::client::{WarehouseClient, WarehouseClientConfig};
use stechuhr_sync::warehouse::fetcher::WarehouseFetcher;
use stechuhr_sync::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub user_repo: PgUserRepository,
    pub timesheet_repo: PgTimesheetRepository,
    pub change_repo: PgChangeRequestRepository,
    pub work_rule_repo: PgWorkRuleRepository,
    pub notification_repo: PgNotificationRepository,
    pub activity_repo: PgActivityRepository,
    pub sync_status_repo: PgSyncStatusRepository,
    pub orchestrator: Arc<Orchestrator<PgActivityRepository, PgSyncStatusRepository>>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:5173".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:5173".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .merge(session::router())
        .merge(timesheet::router())
        .merge(worktime::router())
        .merge(changes::router())
        .merge(activities::router())
        .merge(notifications::router())
        .layer(cors)
        .with_state(state)
}

/// Build the sync orchestrator that backs `POST /sync`. Sources without
/// credentials stay disabled and report "not configured" per run; present
/// but incomplete credentials abort startup.
fn build_orchestrator(
    pool: stechuhr_db::PgPool,
) -> Orchestrator<PgActivityRepository, PgSyncStatusRepository> {
    let mail = match MailClientConfig::from_env() {
        Ok(Some(config)) => Some(MailFetcher::new(
            MailClient::new(config).expect("failed to create mail client"),
        )),
        Ok(None) => None,
        Err(e) => panic!("mail configuration error (fail-fast): {e}"),
    };

    let warehouse = match WarehouseClientConfig::from_env() {
        Ok(Some(config)) => Some(WarehouseFetcher::new(
            WarehouseClient::new(config).expect("failed to create warehouse client"),
        )),
        Ok(None) => None,
        Err(e) => panic!("warehouse configuration error (fail-fast): {e}"),
    };

    let telephony = match TelephonyClientConfig::from_env() {
        Ok(Some(config)) => Some(TelephonyFetcher::new(
            TelephonyClient::new(config).expect("failed to create telephony client"),
        )),
        Ok(None) => None,
        Err(e) => panic!("telephony configuration error (fail-fast): {e}"),
    };

    Orchestrator::new(
        PgActivityRepository::new(pool.clone()),
        PgSyncStatusRepository::new(pool),
        mail,
        warehouse,
        telephony,
    )
}

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = AppConfig::from_env().expect("failed to load config");
    tracing::info!(service = "stechuhr-api", "starting");

    let pool = stechuhr_db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let state = AppState {
        user_repo: PgUserRepository::new(pool.clone()),
        timesheet_repo: PgTimesheetRepository::new(pool.clone()),
        change_repo: PgChangeRequestRepository::new(pool.clone()),
        work_rule_repo: PgWorkRuleRepository::new(pool.clone()),
        notification_repo: PgNotificationRepository::new(pool.clone()),
        activity_repo: PgActivityRepository::new(pool.clone()),
        sync_status_repo: PgSyncStatusRepository::new(pool.clone()),
        orchestrator: Arc::new(build_orchestrator(pool)),
    };

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
