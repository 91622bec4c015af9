//! Application configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::SyncError;

const ENV_PREFIX: &str = "PASSSYNC";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub status: StatusConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

/// Source page of the crossing status
#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    pub url: String,
    #[serde(default = "default_pass_name")]
    pub pass_name: String,
    #[serde(default = "default_status_interval")]
    pub interval_minutes: u64,
}

/// 3-hour forecast feed, OpenWeatherMap compatible
#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_lat")]
    pub lat: f64,
    #[serde(default = "default_lon")]
    pub lon: f64,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Offset of the calendar used to bucket samples into days
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_forecast_interval")]
    pub interval_minutes: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_pass_name() -> String {
    "Cristo Redentor".to_string()
}

fn default_status_interval() -> u64 {
    30
}

fn default_forecast_base_url() -> String {
    "http://api.openweathermap.org/data/2.5/forecast".to_string()
}

fn default_lat() -> f64 {
    -32.8322
}

fn default_lon() -> f64 {
    -70.0450
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_lang() -> String {
    "es".to_string()
}

fn default_utc_offset_hours() -> i32 {
    -3
}

fn default_forecast_interval() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name("config/default").required(false))
    }

    /// Load an explicit configuration file, still overridable from the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        self.database.validate()?;
        self.http.validate()?;
        self.status.validate()?;
        self.forecast.validate()?;
        Ok(())
    }
}

fn configuration_error(message: &str) -> SyncError {
    SyncError::ConfigurationError {
        message: message.to_string(),
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.url.trim().is_empty() {
            return Err(configuration_error("Database URL cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(configuration_error(
                "Database max_connections must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl HttpConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.timeout.is_zero() {
            return Err(configuration_error("HTTP timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl StatusConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.url.trim().is_empty() {
            return Err(configuration_error("Status page URL cannot be empty"));
        }
        if self.pass_name.trim().is_empty() {
            return Err(configuration_error("Pass name cannot be empty"));
        }
        if self.interval_minutes == 0 {
            return Err(configuration_error(
                "Status sync interval must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.base_url.trim().is_empty() {
            return Err(configuration_error("Forecast base URL cannot be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(configuration_error("Forecast API key cannot be empty"));
        }
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(configuration_error("Forecast coordinates out of range"));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(configuration_error("UTC offset must be between -12 and 14 hours"));
        }
        if self.interval_minutes == 0 {
            return Err(configuration_error(
                "Forecast sync interval must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Fixed offset of the local calendar, validated to be in range
    pub fn utc_offset(&self) -> Result<chrono::FixedOffset, SyncError> {
        chrono::FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .ok_or_else(|| configuration_error("UTC offset out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    fn forecast_config() -> ForecastConfig {
        ForecastConfig {
            base_url: default_forecast_base_url(),
            api_key: "secret".to_string(),
            lat: default_lat(),
            lon: default_lon(),
            units: default_units(),
            lang: default_lang(),
            utc_offset_hours: -3,
            interval_minutes: 10,
        }
    }

    #[test]
    fn test_load_config_from_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pass-sync.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[database]
url = "postgres://localhost/pass"

[status]
url = "https://example.org/paso"

[forecast]
api_key = "from-file"
"#
        )
        .unwrap();

        env::set_var("PASSSYNC__FORECAST__INTERVAL_MINUTES", "15");

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.database.url, "postgres://localhost/pass");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.http.timeout, Duration::from_secs(10));
        assert_eq!(config.status.pass_name, "Cristo Redentor");
        assert_eq!(config.status.interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.forecast.api_key, "from-file");
        assert_eq!(config.forecast.interval_minutes, 15);
        assert_eq!(config.forecast.lat, -32.8322);
        assert!(config.validate().is_ok());

        env::remove_var("PASSSYNC__FORECAST__INTERVAL_MINUTES");
    }

    #[test]
    fn test_forecast_config_validate() {
        assert!(forecast_config().validate().is_ok());
    }

    #[test]
    fn test_forecast_config_validate_empty_key() {
        let config = ForecastConfig {
            api_key: " ".to_string(),
            ..forecast_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forecast_config_validate_bad_coordinates() {
        let config = ForecastConfig {
            lat: 120.0,
            ..forecast_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_config_validate_zero_interval() {
        let config = StatusConfig {
            url: "https://example.org".to_string(),
            pass_name: default_pass_name(),
            interval_minutes: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_config_validate_zero_timeout() {
        let config = HttpConfig {
            timeout: Duration::from_secs(0),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_utc_offset() {
        let offset = forecast_config().utc_offset().unwrap();
        assert_eq!(offset.local_minus_utc(), -3 * 3600);
    }
}
