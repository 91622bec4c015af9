//! Status and forecast synchronization jobs
//!
//! Each job run fetches, recomputes and upserts from scratch. Running a job
//! twice against the same source converges on the same stored rows.

use chrono::{FixedOffset, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    database::{ForecastRepository, StatusRepository},
    errors::SyncError,
    fetch::Fetch,
    forecast::aggregate_daily,
    models::{DailyForecast, ForecastFeed, PassStatus, StatusSnapshot},
    status::extract_status,
};

/// Scrapes the crossing status page into the single status record
pub struct StatusSyncJob<F, R> {
    fetcher: F,
    repository: R,
    pass_name: String,
    source_url: String,
}

impl<F: Fetch, R: StatusRepository> StatusSyncJob<F, R> {
    pub fn new(
        fetcher: F,
        repository: R,
        pass_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            repository,
            pass_name: pass_name.into(),
            source_url: source_url.into(),
        }
    }

    /// Fetch, extract and persist the crossing status.
    ///
    /// Fetch failures are stored as sentinel field values rather than
    /// returned; only a storage failure is an error.
    pub async fn run(&self) -> Result<PassStatus, SyncError> {
        info!(pass = %self.pass_name, url = %self.source_url, "Running status sync");

        let snapshot = match self.fetcher.fetch(&self.source_url).await {
            Ok(body) => extract_status(&body),
            Err(e) => {
                warn!(url = %self.source_url, "Status page unavailable: {}", e);
                StatusSnapshot::connection_error(e)
            }
        };

        if !snapshot.is_complete() {
            warn!(
                status = %snapshot.status,
                freshness = %snapshot.freshness,
                hours = %snapshot.hours,
                "Status page extraction degraded"
            );
        }

        let status = self
            .repository
            .upsert_status(&self.pass_name, &snapshot, &self.source_url, Utc::now())
            .await
            .inspect_err(|e| error!("Failed to save pass status: {}", e))?;

        info!(pass = %status.name, status = %status.status, "Status sync done");
        Ok(status)
    }
}

/// Result of a forecast sync run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastSyncOutcome {
    /// Stored days, earliest first
    Updated(Vec<DailyForecast>),
    /// Unattended run without any crossing to forecast for
    NothingToDo,
}

/// Aggregates the 3-hour feed into daily forecasts
pub struct ForecastSyncJob<F, S, R> {
    fetcher: F,
    statuses: S,
    forecasts: R,
    feed_url: String,
    tz: FixedOffset,
}

impl<F: Fetch, S: StatusRepository, R: ForecastRepository> ForecastSyncJob<F, S, R> {
    pub fn new(
        fetcher: F,
        statuses: S,
        forecasts: R,
        feed_url: impl Into<String>,
        tz: FixedOffset,
    ) -> Self {
        Self {
            fetcher,
            statuses,
            forecasts,
            feed_url: feed_url.into(),
            tz,
        }
    }

    /// Unattended run for the first stored crossing.
    pub async fn run_automatic(&self) -> Result<ForecastSyncOutcome, SyncError> {
        let Some(pass) = self.statuses.first_status().await? else {
            info!("No crossing stored yet, skipping forecast sync");
            return Ok(ForecastSyncOutcome::NothingToDo);
        };

        self.run(pass.id).await
    }

    /// Fetch, aggregate and persist forecasts for `pass_id`.
    ///
    /// Any failure leaves the stored forecasts untouched.
    pub async fn run(&self, pass_id: Uuid) -> Result<ForecastSyncOutcome, SyncError> {
        info!(%pass_id, "Running forecast sync");

        let body = self
            .fetcher
            .fetch(&self.feed_url)
            .await
            .inspect_err(|e| error!("Forecast provider unavailable: {}", e))?;

        let samples = ForecastFeed::parse_samples(&body)
            .inspect_err(|e| error!("Invalid forecast response: {}", e))?;

        let days = aggregate_daily(&samples, &self.tz);
        if days.is_empty() {
            warn!(%pass_id, "Forecast feed had no samples");
            return Err(SyncError::NoForecastData);
        }

        let saved = self
            .forecasts
            .upsert_forecasts(pass_id, &days, Utc::now())
            .await
            .inspect_err(|e| error!("Failed to save forecasts: {}", e))?;

        info!(%pass_id, days = saved.len(), "Forecast sync done");
        Ok(ForecastSyncOutcome::Updated(saved))
    }
}
