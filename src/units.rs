use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Measurement system requested from the provider and used for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the provider's `units` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_symbol(self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Units::Metric => Units::Imperial,
            Units::Imperial => Units::Metric,
        }
    }
}

pub mod temperature {
    pub fn c2f(temp_c: f64) -> f64 {
        temp_c * 9.0 / 5.0 + 32.0
    }

    #[test]
    fn test_temperature() {
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(100.0), 212.0);
        assert_eq!(c2f(-40.0), -40.0);
        assert!((c2f(22.0) - 71.6).abs() < 1e-9);
    }
}

pub mod speed {
    const MPH_PER_MS: f64 = 2.236_936;

    pub fn ms2mph(ms: f64) -> f64 {
        ms * MPH_PER_MS
    }

    #[test]
    fn test_speed() {
        assert!((ms2mph(10.0) - 22.36936).abs() < 1e-9);
        assert_eq!(ms2mph(0.0), 0.0);
    }
}

pub mod direction {
    const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

    pub fn degree_to_compass(deg: f64) -> &'static str {
        let deg = deg.rem_euclid(360.0);
        let idx = (deg / 45.0).round() as usize % COMPASS.len();
        COMPASS[idx]
    }

    #[test]
    fn test_degree_to_compass() {
        assert_eq!(degree_to_compass(0.0), "N");
        assert_eq!(degree_to_compass(22.4), "N");
        assert_eq!(degree_to_compass(22.5), "NE");
        assert_eq!(degree_to_compass(90.0), "E");
        assert_eq!(degree_to_compass(180.0), "S");
        assert_eq!(degree_to_compass(270.0), "W");
        assert_eq!(degree_to_compass(340.0), "N");
        assert_eq!(degree_to_compass(360.0), "N");
        assert_eq!(degree_to_compass(-90.0), "W");
    }
}

#[test]
fn test_units() {
    assert_eq!(Units::default(), Units::Metric);
    assert_eq!(Units::Metric.toggled(), Units::Imperial);
    assert_eq!(Units::Imperial.as_param(), "imperial");
    assert_eq!(Units::Imperial.temperature_symbol(), "°F");
}
