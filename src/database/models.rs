// src/database/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{DailyForecast, PassStatus};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PassStatusRow {
    id: Uuid,
    name: String,
    status: String,
    hours_text: String,
    last_updated_text: String,
    source_url: String,
    synced_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DailyForecastRow {
    id: Uuid,
    pass_id: Uuid,
    forecast_date: NaiveDate,
    temp_min: f64,
    temp_max: f64,
    description: String,
    wind_speed_kmh: f64,
    wind_direction: String,
    visibility_m: i32,
    created_at: DateTime<Utc>,
}

impl From<PassStatusRow> for PassStatus {
    fn from(row: PassStatusRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            status: row.status,
            hours_text: row.hours_text,
            last_updated_text: row.last_updated_text,
            source_url: row.source_url,
            synced_at: row.synced_at,
        }
    }
}

impl From<DailyForecastRow> for DailyForecast {
    fn from(row: DailyForecastRow) -> Self {
        Self {
            id: row.id,
            pass_id: row.pass_id,
            forecast_date: row.forecast_date,
            temp_min: row.temp_min,
            temp_max: row.temp_max,
            description: row.description,
            wind_speed_kmh: row.wind_speed_kmh,
            wind_direction: row.wind_direction,
            visibility_m: row.visibility_m,
            created_at: row.created_at,
        }
    }
}
