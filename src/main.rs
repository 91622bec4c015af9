//! Border crossing status and forecast sync service

use pass_sync::{
    config::AppConfig,
    database::Database,
    errors::SyncError,
    fetch::HttpFetcher,
    jobs::{ForecastSyncJob, ForecastSyncOutcome, StatusSyncJob},
};
use tokio::{
    signal,
    time::{Instant, MissedTickBehavior},
};
use tracing::{error, info};

type StatusJob = StatusSyncJob<HttpFetcher, Database>;
type ForecastJob = ForecastSyncJob<HttpFetcher, Database, Database>;

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Configuration file is optional, environment variables override it
    let config = AppConfig::load()?;
    config.validate()?;

    let db = Database::connect(&config.database).await?;
    let fetcher = HttpFetcher::new(config.http.timeout)?;

    let status_job = StatusSyncJob::new(
        fetcher.clone(),
        db.clone(),
        config.status.pass_name.clone(),
        config.status.url.clone(),
    );
    let forecast_job = ForecastSyncJob::new(
        fetcher,
        db.clone(),
        db,
        config.forecast.feed_url()?,
        config.forecast.utc_offset()?,
    );

    // Store the crossing once so the first forecast run has a target
    if let Err(e) = status_job.run().await {
        error!("Initial status sync failed: {}", e);
    }

    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        _ = run_status_loop(&status_job, &config) => {}
        _ = run_forecast_loop(&forecast_job, &config) => {}
        _ = shutdown_signal => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

async fn run_status_loop(job: &StatusJob, config: &AppConfig) {
    let period = config.status.interval();
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = job.run().await {
            error!("Status sync failed: {}", e);
        }
    }
}

async fn run_forecast_loop(job: &ForecastJob, config: &AppConfig) {
    let mut interval = tokio::time::interval(config.forecast.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match job.run_automatic().await {
            Ok(ForecastSyncOutcome::Updated(days)) => {
                info!("Forecast updated for {} days", days.len());
            }
            Ok(ForecastSyncOutcome::NothingToDo) => {}
            Err(e) => error!("Forecast sync failed: {}", e),
        }
    }
}
