//! Synthetic forecast and air quality in the provider's shapes.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::aqi::PollutantReading;
use crate::owm::air_pollution::{AirPollution, Index, Sample};
use crate::owm::forecast::{City, Clouds, Conditions, Coord, Entry, Forecast, Main, Wind};
use crate::units::{speed, temperature, Units};
use crate::weather::Query;

const ENTRIES: usize = 60;
const STEP_SECS: i64 = 3 * 60 * 60;
const HALF_DAY_SECS: i64 = 6 * 60 * 60;
const BASE_TEMP_C: f64 = 22.0;
const DEFAULT_COORD: Coord = Coord {
    lat: 35.6762,
    lon: 139.6503,
};
const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Local data generator used when no API key is configured.
#[derive(Debug)]
pub struct DemoSource {
    rng: StdRng,
}

impl DemoSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn forecast(&mut self, query: &Query, units: Units, now: DateTime<Utc>) -> Forecast {
        generate_forecast(&mut self.rng, query, units, now)
    }

    pub fn air_pollution(&mut self, now: DateTime<Utc>) -> AirPollution {
        generate_air_pollution(&mut self.rng, now)
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

fn conditions_for(step: usize) -> (&'static str, &'static str) {
    match step % 20 {
        15.. => ("Snow", "light snow"),
        10.. => ("Rain", "moderate rain"),
        5.. => ("Clouds", "scattered clouds"),
        _ => ("Clear", "clear sky"),
    }
}

pub fn generate_forecast<R: Rng>(rng: &mut R, query: &Query, units: Units, now: DateTime<Utc>) -> Forecast {
    let now_ts = now.timestamp();
    let offset = rng.gen_range(-3600..3600);

    let (name, coord) = match query {
        Query::City(name) => (name.clone(), DEFAULT_COORD),
        Query::Coordinates { lat, lon } => (
            UNKNOWN_LOCATION.to_string(),
            Coord {
                lat: *lat,
                lon: *lon,
            },
        ),
    };

    let city = City {
        name,
        country: "XX".to_string(),
        coord,
        population: 1_000_000,
        timezone: 0,
        sunrise: now_ts - HALF_DAY_SECS + offset,
        sunset: now_ts + HALF_DAY_SECS + offset,
    };

    let base = match units {
        Units::Metric => BASE_TEMP_C,
        Units::Imperial => temperature::c2f(BASE_TEMP_C),
    };

    let list = (0..ENTRIES)
        .map(|i| {
            let fluctuation = (i as f64 / 4.0).sin() * 5.0;
            let (main, description) = conditions_for(i);
            let wind_ms = rng.gen_range(3.0..8.0);
            Entry {
                dt: now_ts + i as i64 * STEP_SECS,
                main: Main {
                    temp: base + fluctuation + rng.gen_range(-1.0..1.0),
                    feels_like: base + fluctuation - 1.0,
                    temp_min: base + fluctuation - 2.0,
                    temp_max: base + fluctuation + 2.0,
                    pressure: f64::from(rng.gen_range(1012_u32..1022)),
                    humidity: f64::from(rng.gen_range(45_u32..65)),
                    uvi: Some(rng.gen_range(0.0..10.0)),
                },
                weather: vec![Conditions {
                    id: 800,
                    main: main.to_string(),
                    description: description.to_string(),
                    icon: if main == "Clear" { "01d" } else { "10d" }.to_string(),
                }],
                clouds: Clouds {
                    all: rng.gen_range(0..100),
                },
                wind: Wind {
                    speed: match units {
                        Units::Metric => wind_ms,
                        Units::Imperial => speed::ms2mph(wind_ms),
                    },
                    deg: f64::from(rng.gen_range(0_u32..360)),
                },
                visibility: Some(10_000),
                pop: 0.2,
            }
        })
        .collect();

    debug!(city = %city.name, entries = ENTRIES, "generated demo forecast");
    Forecast { city, list }
}

/// Provider style 1-5 category for a PM2.5 concentration.
pub fn coarse_index(pm2_5: f64) -> u8 {
    match pm2_5 {
        c if c < 10.0 => 1,
        c if c < 25.0 => 2,
        c if c < 50.0 => 3,
        c if c < 75.0 => 4,
        _ => 5,
    }
}

pub fn generate_air_pollution<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> AirPollution {
    let bad_day = rng.gen_bool(0.4);
    let pm2_5 = if bad_day {
        rng.gen_range(50.0..200.0)
    } else {
        rng.gen_range(5.0..45.0)
    };

    let components = PollutantReading {
        co: rng.gen_range(200.0..400.0),
        no: 0.5,
        no2: rng.gen_range(10.0..30.0),
        o3: rng.gen_range(60.0..100.0),
        so2: rng.gen_range(5.0..20.0),
        nh3: 0.5,
        pm2_5: Some(pm2_5),
        pm10: pm2_5 * rng.gen_range(1.2..1.7),
    };

    debug!(pm2_5, bad_day, "generated demo air quality");
    AirPollution {
        list: vec![Sample {
            main: Index {
                aqi: coarse_index(pm2_5),
            },
            components,
            dt: now.timestamp(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_forecast_shape() {
        let mut demo = DemoSource::with_seed(7);
        let forecast = demo.forecast(&Query::City("Reykjavik".into()), Units::Metric, now());

        assert_eq!(forecast.city.name, "Reykjavik");
        assert_eq!(forecast.city.coord, DEFAULT_COORD);
        assert_eq!(forecast.list.len(), 60);
        assert_eq!(forecast.list[1].dt - forecast.list[0].dt, STEP_SECS);
        assert!(forecast.city.sunrise < now().timestamp());
        assert!(forecast.city.sunset > now().timestamp());
        assert_eq!(forecast.city.sunset - forecast.city.sunrise, 2 * HALF_DAY_SECS);

        for entry in &forecast.list {
            assert!((14.0..=30.0).contains(&entry.main.temp));
            assert!((45.0..65.0).contains(&entry.main.humidity));
            assert!((3.0..8.0).contains(&entry.wind.speed));
        }
    }

    #[test]
    fn test_forecast_coordinates() {
        let mut demo = DemoSource::with_seed(7);
        let query = Query::Coordinates { lat: -33.9, lon: 18.4 };
        let forecast = demo.forecast(&query, Units::Imperial, now());
        assert_eq!(forecast.city.name, UNKNOWN_LOCATION);
        assert_eq!(forecast.city.coord, Coord { lat: -33.9, lon: 18.4 });
        assert!(forecast.list[0].main.temp > 60.0);
    }

    #[rstest]
    #[case(0, "Clear")]
    #[case(4, "Clear")]
    #[case(5, "Clouds")]
    #[case(10, "Rain")]
    #[case(15, "Snow")]
    #[case(19, "Snow")]
    #[case(20, "Clear")]
    fn test_conditions_cycle(#[case] step: usize, #[case] expected: &str) {
        assert_eq!(conditions_for(step).0, expected);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = DemoSource::with_seed(42).air_pollution(now());
        let b = DemoSource::with_seed(42).air_pollution(now());
        assert_eq!(a, b);

        let query = Query::City("Quito".into());
        let a = DemoSource::with_seed(42).forecast(&query, Units::Metric, now());
        let b = DemoSource::with_seed(42).forecast(&query, Units::Metric, now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_air_pollution_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let air = generate_air_pollution(&mut rng, now());
            let sample = &air.list[0];
            let pm2_5 = sample.components.pm2_5.unwrap();
            assert!((5.0..200.0).contains(&pm2_5));
            assert!(sample.components.pm10 >= pm2_5 * 1.2);
            assert_eq!(sample.main.aqi, coarse_index(pm2_5));
        }
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(9.9, 1)]
    #[case(10.0, 2)]
    #[case(30.0, 3)]
    #[case(60.0, 4)]
    #[case(180.0, 5)]
    fn test_coarse_index(#[case] pm2_5: f64, #[case] expected: u8) {
        assert_eq!(coarse_index(pm2_5), expected);
    }
}
