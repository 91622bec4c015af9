//! Data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SyncError;

/// Monitored border crossing and its last scraped status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassStatus {
    pub id: Uuid,
    /// Human label of the crossing, immutable after creation
    pub name: String,
    /// Operational state ("Abierto", "Cerrado", or an error sentinel)
    pub status: String,
    /// Opening hours window, or a sentinel describing why it is unknown
    pub hours_text: String,
    /// "As of" text captured verbatim from the source page
    pub last_updated_text: String,
    pub source_url: String,
    pub synced_at: DateTime<Utc>,
}

/// Aggregated forecast for one crossing and one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub id: Uuid,
    pub pass_id: Uuid,
    pub forecast_date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub wind_speed_kmh: f64,
    pub wind_direction: String,
    pub visibility_m: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields extracted from the status page.
///
/// Every field always holds a displayable value: either what was found on
/// the page, or a sentinel explaining what could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: String,
    pub freshness: String,
    pub hours: String,
}

/// One day of aggregated forecast values, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    pub forecast_date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub wind_speed_kmh: f64,
    pub wind_direction: String,
    pub visibility_m: i32,
}

/// A single 3-hour forecast sample
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Seconds from Unix epoch
    pub dt: i64,
    /// Instantaneous temperature, °C
    pub temp: f64,
    /// Wind speed, m/s
    pub wind_speed: f64,
    pub description: String,
}

/// Top-level forecast feed document
///
/// See: https://openweathermap.org/forecast5
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastFeed {
    pub list: Option<Vec<FeedEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    pub dt: i64,
    pub main: FeedMain,
    pub wind: FeedWind,
    #[serde(default)]
    pub weather: Vec<FeedWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedWeather {
    pub description: String,
}

impl ForecastFeed {
    /// Decode a raw feed body into samples.
    ///
    /// A document without `list`, or an entry without a weather
    /// description, is an invalid response.
    pub fn parse_samples(body: &str) -> Result<Vec<ForecastSample>, SyncError> {
        let feed: ForecastFeed = serde_json::from_str(body)?;
        let entries = feed
            .list
            .ok_or_else(|| SyncError::InvalidResponse("missing `list` key".to_string()))?;

        entries
            .into_iter()
            .map(|entry| {
                let description = entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.description)
                    .ok_or_else(|| {
                        SyncError::InvalidResponse(format!(
                            "sample at {} has no weather description",
                            entry.dt
                        ))
                    })?;
                Ok(ForecastSample {
                    dt: entry.dt,
                    temp: entry.main.temp,
                    wind_speed: entry.wind.speed,
                    description,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_feed_samples() {
        let s = r#"{
          "cod" : "200",
          "cnt" : 2,
          "list" : [
            {
              "dt" : 1760886000,
              "main" : { "temp" : 4.2, "temp_min" : 3.9, "temp_max" : 4.2 },
              "weather" : [ { "id" : 800, "main" : "Clear", "description" : "cielo claro" } ],
              "wind" : { "speed" : 3.1, "deg" : 270 }
            },
            {
              "dt" : 1760896800,
              "main" : { "temp" : -1.5 },
              "weather" : [ { "description" : "nubes" }, { "description" : "nieve" } ],
              "wind" : { "speed" : 5.0 }
            }
          ]
        }"#;
        let samples = ForecastFeed::parse_samples(s).unwrap();
        let expected = vec![
            ForecastSample {
                dt: 1760886000,
                temp: 4.2,
                wind_speed: 3.1,
                description: "cielo claro".to_string(),
            },
            ForecastSample {
                dt: 1760896800,
                temp: -1.5,
                wind_speed: 5.0,
                description: "nubes".to_string(),
            },
        ];

        assert_eq!(samples, expected);
    }

    #[test]
    fn parse_feed_without_list() {
        let s = r#"{ "cod" : "401", "message" : "Invalid API key" }"#;
        let result = ForecastFeed::parse_samples(s);
        assert!(matches!(result, Err(SyncError::InvalidResponse(_))));
    }

    #[test]
    fn parse_feed_sample_without_weather() {
        let s = r#"{ "list" : [ { "dt" : 1, "main" : { "temp" : 1.0 }, "wind" : { "speed" : 1.0 }, "weather" : [] } ] }"#;
        let result = ForecastFeed::parse_samples(s);
        assert!(matches!(result, Err(SyncError::InvalidResponse(_))));
    }

    #[test]
    fn parse_feed_not_json() {
        let result = ForecastFeed::parse_samples("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(SyncError::SerdeError(_))));
    }
}
