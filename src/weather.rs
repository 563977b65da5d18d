//! Dashboard views derived from a fetched snapshot.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use std::fmt;

use crate::aqi::AqiResult;
use crate::owm::air_pollution::Sample;
use crate::owm::forecast::{Entry, Forecast};
use crate::units::{direction, Units};

/// Entries per day in the 3 hour forecast.
const ENTRIES_PER_DAY: usize = 8;
const TREND_POINTS: usize = 9;
const FORECAST_DAYS: usize = 7;

/// Location requested by the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Query {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::City(name) => write!(f, "{name}"),
            Query::Coordinates { lat, lon } => write!(f, "{lat:.4}, {lon:.4}"),
        }
    }
}

/// Which acquisition path produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Demo,
    Live,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Demo => write!(f, "DEMO"),
            Mode::Live => write!(f, "LIVE"),
        }
    }
}

/// Everything the dashboard renders for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub units: Units,
    pub forecast: Forecast,
    pub air: Option<Sample>,
    pub aqi: AqiResult,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn current(&self) -> Option<&Entry> {
        self.forecast.current()
    }

    /// UTC offset of the forecast location.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.forecast.city.timezone).unwrap_or_else(|| Utc.fix())
    }

    pub fn local_time(&self, timestamp: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&self.offset()))
    }

    /// Hour label and rounded temperature for the first 24 hours.
    pub fn trend(&self) -> Vec<(String, i64)> {
        self.forecast
            .list
            .iter()
            .take(TREND_POINTS)
            .map(|entry| {
                let label = self
                    .local_time(entry.dt)
                    .map(|dt| format!("{}:00", dt.format("%-H")))
                    .unwrap_or_else(|| "--".to_string());
                (label, entry.main.temp.round() as i64)
            })
            .collect()
    }

    /// One entry per day, a day apart, starting with the current one.
    pub fn daily(&self) -> Vec<&Entry> {
        (0..FORECAST_DAYS)
            .filter_map(|day| self.forecast.list.get(day * ENTRIES_PER_DAY))
            .collect()
    }

    pub fn solar_phase(&self, now: DateTime<Utc>) -> SolarPhase {
        SolarPhase::at(
            self.forecast.city.sunrise,
            self.forecast.city.sunset,
            now.timestamp(),
        )
    }
}

/// Position of the sun between sunrise and sunset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarPhase {
    PreDawn,
    /// Fraction of daylight elapsed, 0.0 at sunrise and 1.0 at sunset.
    Day(f64),
    Night,
}

impl SolarPhase {
    pub fn at(sunrise: i64, sunset: i64, now: i64) -> Self {
        let day_length = sunset - sunrise;
        if day_length <= 0 {
            return SolarPhase::Night;
        }
        let progress = (now - sunrise) as f64 / day_length as f64;
        if progress < 0.0 {
            SolarPhase::PreDawn
        } else if progress > 1.0 {
            SolarPhase::Night
        } else {
            SolarPhase::Day(progress)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SolarPhase::PreDawn => "Pre-Dawn",
            SolarPhase::Day(_) => "Daylight",
            SolarPhase::Night => "Night Time",
        }
    }
}

/// Visual theme picked from the provider's condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Rain,
    Snow,
    Clouds,
    Clear,
    Thunder,
    Other,
}

impl Condition {
    pub fn from_main(main: &str) -> Self {
        let main = main.to_lowercase();
        if main.contains("rain") || main.contains("drizzle") {
            Condition::Rain
        } else if main.contains("snow") {
            Condition::Snow
        } else if main.contains("cloud") {
            Condition::Clouds
        } else if main.contains("clear") {
            Condition::Clear
        } else if main.contains("thunder") {
            Condition::Thunder
        } else {
            Condition::Other
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Condition::Rain => "☂",
            Condition::Snow => "❄",
            Condition::Clouds => "☁",
            Condition::Clear => "☀",
            Condition::Thunder => "⚡",
            Condition::Other => "·",
        }
    }
}

/// Readouts shown in the stats grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub feels_like: i64,
    pub wind_direction: &'static str,
    pub wind_speed: i64,
    pub humidity: i64,
    pub uv: String,
    pub uv_level: &'static str,
    pub visibility_km: Option<f64>,
    pub pressure: i64,
}

impl Stats {
    pub fn from_entry(entry: &Entry) -> Self {
        let uvi = entry.main.uvi.unwrap_or(0.0);
        let uv = match uvi.round() as i64 {
            0 => "Low".to_string(),
            rounded => rounded.to_string(),
        };
        Self {
            feels_like: entry.main.feels_like.round() as i64,
            wind_direction: direction::degree_to_compass(entry.wind.deg),
            wind_speed: entry.wind.speed.round() as i64,
            humidity: entry.main.humidity.round() as i64,
            uv,
            uv_level: if uvi > 5.0 { "High" } else { "Weak" },
            visibility_km: entry.visibility.map(|meters| f64::from(meters) / 1000.0),
            pressure: entry.main.pressure.round() as i64,
        }
    }
}
