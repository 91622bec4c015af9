// src/database.rs
mod models;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    errors::SyncError,
    models::{DailyForecast, DayForecast, PassStatus, StatusSnapshot},
};
use models::{DailyForecastRow, PassStatusRow};

const PASS_STATUS_COLUMNS: &str =
    "id, name, status, hours_text, last_updated_text, source_url, synced_at";

const DAILY_FORECAST_COLUMNS: &str = "id, pass_id, forecast_date, temp_min, temp_max, \
     description, wind_speed_kmh, wind_direction, visibility_m, created_at";

/// Storage of the crossing status record, keyed by crossing name
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Create the crossing if absent, otherwise overwrite its status fields.
    async fn upsert_status(
        &self,
        name: &str,
        snapshot: &StatusSnapshot,
        source_url: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<PassStatus, SyncError>;

    /// Crossing used when a job runs unattended
    async fn first_status(&self) -> Result<Option<PassStatus>, SyncError>;

    async fn status_by_name(&self, name: &str) -> Result<Option<PassStatus>, SyncError>;
}

/// Storage of daily forecasts, keyed by (crossing, date)
#[async_trait]
pub trait ForecastRepository: Send + Sync {
    /// Upsert all days in one transaction. Nothing is written if any day fails.
    async fn upsert_forecasts(
        &self,
        pass_id: Uuid,
        days: &[DayForecast],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<DailyForecast>, SyncError>;

    /// The `limit` latest forecast dates for a crossing, earliest first
    async fn latest_forecasts(
        &self,
        pass_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DailyForecast>, SyncError>;
}

/// PostgreSQL storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and run pending migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, SyncError> {
        info!(
            "Connecting to database, max_connections={}",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .inspect_err(|e| error!("Failed to connect to database: {}", e))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .inspect_err(|e| error!("Failed to run migrations: {}", e))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl StatusRepository for Database {
    async fn upsert_status(
        &self,
        name: &str,
        snapshot: &StatusSnapshot,
        source_url: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<PassStatus, SyncError> {
        let mut tx = self.pool.begin().await?;

        // Name is the natural key, the generated id is only used on insert
        let row: PassStatusRow = sqlx::query_as(&format!(
            "INSERT INTO pass_status (
                id, name, status, hours_text, last_updated_text, source_url, synced_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO UPDATE SET
                status = EXCLUDED.status,
                hours_text = EXCLUDED.hours_text,
                last_updated_text = EXCLUDED.last_updated_text,
                source_url = EXCLUDED.source_url,
                synced_at = EXCLUDED.synced_at
            RETURNING {PASS_STATUS_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&snapshot.status)
        .bind(&snapshot.hours)
        .bind(&snapshot.freshness)
        .bind(source_url)
        .bind(synced_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn first_status(&self) -> Result<Option<PassStatus>, SyncError> {
        let row: Option<PassStatusRow> = sqlx::query_as(&format!(
            "SELECT {PASS_STATUS_COLUMNS} FROM pass_status ORDER BY name, id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn status_by_name(&self, name: &str) -> Result<Option<PassStatus>, SyncError> {
        let row: Option<PassStatusRow> = sqlx::query_as(&format!(
            "SELECT {PASS_STATUS_COLUMNS} FROM pass_status WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl ForecastRepository for Database {
    async fn upsert_forecasts(
        &self,
        pass_id: Uuid,
        days: &[DayForecast],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<DailyForecast>, SyncError> {
        let query = format!(
            "INSERT INTO daily_forecast (
                id, pass_id, forecast_date, temp_min, temp_max, description,
                wind_speed_kmh, wind_direction, visibility_m, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (pass_id, forecast_date) DO UPDATE SET
                temp_min = EXCLUDED.temp_min,
                temp_max = EXCLUDED.temp_max,
                description = EXCLUDED.description,
                wind_speed_kmh = EXCLUDED.wind_speed_kmh,
                wind_direction = EXCLUDED.wind_direction,
                visibility_m = EXCLUDED.visibility_m,
                created_at = EXCLUDED.created_at
            RETURNING {DAILY_FORECAST_COLUMNS}"
        );

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(days.len());

        for day in days {
            let row: DailyForecastRow = sqlx::query_as(&query)
                .bind(Uuid::new_v4())
                .bind(pass_id)
                .bind(day.forecast_date)
                .bind(day.temp_min)
                .bind(day.temp_max)
                .bind(&day.description)
                .bind(day.wind_speed_kmh)
                .bind(&day.wind_direction)
                .bind(day.visibility_m)
                .bind(created_at)
                .fetch_one(&mut *tx)
                .await?;
            saved.push(row.into());
        }

        tx.commit().await?;

        Ok(saved)
    }

    async fn latest_forecasts(
        &self,
        pass_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DailyForecast>, SyncError> {
        let rows: Vec<DailyForecastRow> = sqlx::query_as(&format!(
            "SELECT {DAILY_FORECAST_COLUMNS} FROM daily_forecast
            WHERE pass_id = $1
            ORDER BY forecast_date DESC
            LIMIT $2"
        ))
        .bind(pass_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().rev().map(Into::into).collect())
    }
}
