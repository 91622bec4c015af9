//! Daily forecast aggregation over 3-hour samples

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone};
use tracing::warn;

use crate::models::{DayForecast, ForecastSample};

/// Number of days kept: today and the next three
pub const FORECAST_DAYS: usize = 4;

/// The feed has no usable daily wind direction, a fixed label is stored
pub const WIND_DIRECTION_PLACEHOLDER: &str = "Oeste";

/// The feed has no usable daily visibility, a fixed value is stored
pub const VISIBILITY_PLACEHOLDER_M: i32 = 10_000;

const MS_TO_KMH: f64 = 3.6;

/// Running aggregates for one calendar day
#[derive(Debug)]
struct DayAccumulator {
    temp_min: f64,
    temp_max: f64,
    wind_sum: f64,
    count: u32,
    /// Description counts, in order of first occurrence
    descriptions: Vec<(String, u32)>,
}

impl DayAccumulator {
    fn new() -> Self {
        Self {
            temp_min: f64::INFINITY,
            temp_max: f64::NEG_INFINITY,
            wind_sum: 0.0,
            count: 0,
            descriptions: Vec::new(),
        }
    }

    fn add(&mut self, sample: &ForecastSample) {
        self.temp_min = self.temp_min.min(sample.temp);
        self.temp_max = self.temp_max.max(sample.temp);
        self.wind_sum += sample.wind_speed;
        self.count += 1;

        match self
            .descriptions
            .iter_mut()
            .find(|(description, _)| *description == sample.description)
        {
            Some((_, n)) => *n += 1,
            None => self.descriptions.push((sample.description.clone(), 1)),
        }
    }

    /// Most frequent description; ties go to the one seen first
    fn most_common_description(&self) -> &str {
        let mut best: Option<&(String, u32)> = None;
        for entry in &self.descriptions {
            if best.map_or(true, |(_, n)| entry.1 > *n) {
                best = Some(entry);
            }
        }
        best.map(|(description, _)| description.as_str()).unwrap_or_default()
    }

    fn finish(self, forecast_date: NaiveDate) -> DayForecast {
        let wind_avg = if self.count > 0 {
            self.wind_sum / f64::from(self.count)
        } else {
            0.0
        };

        DayForecast {
            forecast_date,
            temp_min: round1(self.temp_min),
            temp_max: round1(self.temp_max),
            description: capitalize(self.most_common_description()),
            wind_speed_kmh: round1(wind_avg * MS_TO_KMH),
            wind_direction: WIND_DIRECTION_PLACEHOLDER.to_string(),
            visibility_m: VISIBILITY_PLACEHOLDER_M,
        }
    }
}

/// Group samples by local calendar day and aggregate each day.
///
/// Returns at most [`FORECAST_DAYS`] days, earliest first. Samples with a
/// timestamp outside the representable range are skipped.
pub fn aggregate_daily<Tz: TimeZone>(samples: &[ForecastSample], tz: &Tz) -> Vec<DayForecast> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for sample in samples {
        let Some(utc) = DateTime::from_timestamp(sample.dt, 0) else {
            warn!(dt = sample.dt, "Skipping forecast sample with invalid timestamp");
            continue;
        };
        let date = utc.with_timezone(tz).date_naive();

        days.entry(date)
            .or_insert_with(DayAccumulator::new)
            .add(sample);
    }

    days.into_iter()
        .take(FORECAST_DAYS)
        .map(|(date, acc)| acc.finish(date))
        .collect()
}

/// Round to one decimal from the exact binary value, ties to even
fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Upper-case the first character and lower-case the rest
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
