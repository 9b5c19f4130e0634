use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use tokio::sync::watch;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "saldo={level},ledger={level},settlement={level},treasury={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(settings.database.path.as_deref()).await?;
    let ledger = ledger::Ledger::builder().database(db).build();

    let timeout = settings
        .settlement
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(settlement::DEFAULT_TIMEOUT);
    let processor = settlement::ProcessorClient::new(
        &settings.settlement.url,
        &settings.settlement.invoice_key,
        &settings.settlement.admin_key,
        timeout,
    )?;

    let withdraw_fee_sats = settings
        .treasury
        .withdraw_fee_sats
        .unwrap_or(treasury::DEFAULT_WITHDRAW_FEE_SATS);
    let poll_interval = settings
        .treasury
        .poll_interval_secs
        .map(Duration::from_secs)
        .unwrap_or(treasury::DEFAULT_POLL_INTERVAL);

    let treasury = treasury::Treasury::new(ledger.clone(), processor.clone(), withdraw_fee_sats);
    match treasury.coverage().await {
        Ok(report) if report.is_covered() => {
            tracing::info!(
                processor_sats = report.processor_sats,
                ledger_sats = report.ledger_sats,
                "processor balance covers ledger liabilities"
            );
        }
        Ok(report) => {
            tracing::warn!(
                shortfall_sats = report.shortfall_sats(),
                "processor balance does not cover ledger liabilities"
            );
        }
        Err(err) => tracing::warn!("startup coverage check failed: {err}"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = treasury::Reconciler::new(ledger, processor, poll_interval);

    let mut tasks = tokio::task::JoinSet::new();
    tasks.spawn(reconciler.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    while tasks.join_next().await.is_some() {}

    Ok(())
}

async fn parse_database(
    path: Option<&str>,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match path {
        None => String::from("sqlite::memory:"),
        Some(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
