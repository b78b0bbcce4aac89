use stechuhr_config::init_tracing;
use stechuhr_db::activity::pg_repository::PgActivityRepository;
use stechuhr_db::sync_state::pg_repository::PgSyncStatusRepository;

use stechuhr_sync::mail::client::{MailClient, MailClientConfig};
use stechuhr_sync::mail::fetcher::MailFetcher;
use stechuhr_sync::telephony::client::{TelephonyClient, TelephonyClientConfig};
use stechuhr_sync::telephony::fetcher::TelephonyFetcher;
use stechuhr_sync::warehouse::client::{WarehouseClient, WarehouseClientConfig};
use stechuhr_sync::warehouse::fetcher::WarehouseFetcher;
use stechuhr_sync::Orchestrator;

#[tokio::main]
async fn main() {
    init_tracing("info");
    let _ = dotenvy::dotenv();

    tracing::info!(service = "stechuhr-sync", "starting");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = stechuhr_db::create_pool(&database_url)
        .await
        .expect("failed to connect to database");

    // Each source is optional; credentials present but incomplete is a
    // hard error (fail-fast on misconfiguration).
    let mail = match MailClientConfig::from_env() {
        Ok(Some(config)) => {
            tracing::info!(accounts = ?config.accounts, "mail source configured");
            Some(MailFetcher::new(
                MailClient::new(config).expect("failed to create mail client"),
            ))
        }
        Ok(None) => {
            tracing::info!("no mail credentials found, mail source disabled");
            None
        }
        Err(e) => panic!("mail configuration error (fail-fast): {e}"),
    };

    let warehouse = match WarehouseClientConfig::from_env() {
        Ok(Some(config)) => {
            tracing::info!(team = %config.team_name, "warehouse source configured");
            Some(WarehouseFetcher::new(
                WarehouseClient::new(config).expect("failed to create warehouse client"),
            ))
        }
        Ok(None) => {
            tracing::info!("no warehouse credentials found, warehouse source disabled");
            None
        }
        Err(e) => panic!("warehouse configuration error (fail-fast): {e}"),
    };

    let telephony = match TelephonyClientConfig::from_env() {
        Ok(Some(config)) => {
            tracing::info!(
                allowed = config.allowed_numbers.len(),
                "telephony source configured"
            );
            Some(TelephonyFetcher::new(
                TelephonyClient::new(config).expect("failed to create telephony client"),
            ))
        }
        Ok(None) => {
            tracing::info!("no telephony credentials found, telephony source disabled");
            None
        }
        Err(e) => panic!("telephony configuration error (fail-fast): {e}"),
    };

    let orchestrator = Orchestrator::new(
        PgActivityRepository::new(pool.clone()),
        PgSyncStatusRepository::new(pool),
        mail,
        warehouse,
        telephony,
    );

    let report = orchestrator.run_sync().await;
    for outcome in &report.sources {
        tracing::info!(
            source = outcome.source.as_str(),
            success = outcome.success,
            count = outcome.count,
            message = %outcome.message,
            "source sync outcome"
        );
    }
    tracing::info!(
        total = report.total_count(),
        all_succeeded = report.all_succeeded(),
        "sync run complete"
    );
}
