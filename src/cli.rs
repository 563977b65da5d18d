use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;
use std::path::PathBuf;

use crate::config::Settings;
use crate::units::Units;
use crate::weather::Query;

const ABOUT: &str = "Terminal weather dashboard with US EPA air quality";

const LONG_ABOUT: &str = "
Terminal dashboard showing current conditions, a 24 hour temperature trend, air quality, the solar
cycle, and a multi-day forecast for a city or a pair of coordinates.

Without an OpenWeatherMap API key the dashboard runs on generated demo data. Supply a key with
--api-key (or SKYCAST_API_KEY) and pass --live to switch to the real provider. The key, units,
mode, and last searched city are saved, so subsequent runs of `skycast` pick up where you left off.
";

const DEFAULT_CITY: &str = "San Francisco";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, Default)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "City to show (e.g. \"San Francisco\", \"London,GB\")")]
    pub city: Option<String>,

    #[arg(long, allow_hyphen_values = true, requires = "lon", help = "Latitude in degrees")]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "lat", help = "Longitude in degrees")]
    pub lon: Option<f64>,

    #[arg(long, value_enum, help = "Units for temperature and wind speed")]
    pub units: Option<Units>,

    #[arg(long, env = "SKYCAST_API_KEY", hide_env_values = true, help = "OpenWeatherMap API key")]
    pub api_key: Option<String>,

    #[arg(long, conflicts_with = "live", help = "Use generated demo data")]
    pub demo: bool,

    #[arg(long, help = "Use the live OpenWeatherMap provider")]
    pub live: bool,

    #[arg(long, help = "Seed for reproducible demo data")]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 600, help = "Seconds between automatic refreshes")]
    pub refresh_secs: u64,

    #[arg(long, help = "Print one snapshot as JSON and exit")]
    pub json: bool,

    #[arg(long, help = "Settings file location")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Log file location")]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value = "info", help = "Log level or filter directives")]
    pub log_level: String,
}

impl Args {
    /// Fold command line overrides into the saved settings. Returns true when
    /// anything changed and the settings should be written back.
    pub fn apply(&self, settings: &mut Settings) -> bool {
        let before = settings.clone();
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.trim().to_string());
        }
        if let Some(units) = self.units {
            settings.units = units;
        }
        if self.demo {
            settings.demo_mode = true;
        }
        if self.live {
            settings.demo_mode = false;
        }
        if let Some(city) = self.city() {
            settings.last_city = Some(city.to_string());
        }
        *settings != before
    }

    fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }

    /// Coordinates, then the typed city, then the saved city, then the default.
    pub fn query(&self, settings: &Settings) -> Query {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Query::Coordinates { lat, lon };
        }
        let city = self
            .city()
            .or(settings.last_city.as_deref())
            .unwrap_or(DEFAULT_CITY);
        Query::City(city.to_string())
    }
}
