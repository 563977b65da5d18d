use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::units::Units;
use crate::weather::Query;

/// OpenWeatherMap 2.5 API root.
pub const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const TIMEOUT: Duration = Duration::from_secs(10);

pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent("skycast")
        .timeout(TIMEOUT)
        .build()?)
}

pub mod forecast {
    use super::*;

    /// 5 day / 3 hour forecast.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Forecast {
        pub city: City,
        pub list: Vec<Entry>,
    }

    impl Forecast {
        pub fn from_owm(
            client: &Client,
            base_url: &str,
            api_key: &str,
            query: &Query,
            units: Units,
        ) -> Result<Self> {
            let url = format!("{base_url}/forecast");
            let mut params = vec![
                ("units", units.as_param().to_string()),
                ("appid", api_key.to_string()),
            ];
            params.extend(query_params(query));

            let response = get_web_json(client, &url, &params)?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(Error::LocationNotFound(query.to_string()));
            }
            Ok(response.error_for_status()?.json()?)
        }

        pub fn current(&self) -> Option<&Entry> {
            self.list.first()
        }
    }

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct City {
        pub name: String,

        #[serde(default)]
        pub country: String,

        pub coord: Coord,

        #[serde(default)]
        pub population: u64,

        /// Shift from UTC in seconds.
        #[serde(default)]
        pub timezone: i32,

        pub sunrise: i64,

        pub sunset: i64,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
    pub struct Coord {
        pub lat: f64,
        pub lon: f64,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Entry {
        pub dt: i64,

        pub main: Main,

        pub weather: Vec<Conditions>,

        #[serde(default)]
        pub clouds: Clouds,

        #[serde(default)]
        pub wind: Wind,

        #[serde(default)]
        pub visibility: Option<u32>,

        #[serde(default)]
        pub pop: f64,
    }

    impl Entry {
        pub fn conditions(&self) -> Option<&Conditions> {
            self.weather.first()
        }
    }

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Main {
        pub temp: f64,
        pub feels_like: f64,
        pub temp_min: f64,
        pub temp_max: f64,
        pub pressure: f64,
        pub humidity: f64,

        #[serde(default)]
        pub uvi: Option<f64>,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Conditions {
        #[serde(default)]
        pub id: u32,
        pub main: String,
        pub description: String,
        #[serde(default)]
        pub icon: String,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
    pub struct Clouds {
        pub all: u8,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
    pub struct Wind {
        pub speed: f64,
        pub deg: f64,
    }
}

pub mod air_pollution {
    use super::*;
    use crate::aqi::PollutantReading;

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
    pub struct AirPollution {
        pub list: Vec<Sample>,
    }

    impl AirPollution {
        pub fn from_owm(
            client: &Client,
            base_url: &str,
            api_key: &str,
            coord: forecast::Coord,
        ) -> Result<Self> {
            let url = format!("{base_url}/air_pollution");
            let params = [
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
                ("appid", api_key.to_string()),
            ];
            Ok(get_web_json(client, &url, &params)?
                .error_for_status()?
                .json()?)
        }
    }

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Sample {
        pub main: Index,
        pub components: PollutantReading,
        pub dt: i64,
    }

    /// Provider's own 1 (good) to 5 (very poor) category.
    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
    pub struct Index {
        pub aqi: u8,
    }
}

fn query_params(query: &Query) -> Vec<(&'static str, String)> {
    match query {
        Query::City(name) => vec![("q", name.clone())],
        Query::Coordinates { lat, lon } => vec![("lat", lat.to_string()), ("lon", lon.to_string())],
    }
}

fn get_web_json(client: &Client, url: &str, params: &[(&str, String)]) -> Result<Response> {
    Ok(client.get(url).query(params).send()?)
}

#[cfg(test)]
mod tests {
    use super::air_pollution::AirPollution;
    use super::forecast::Forecast;
    use super::*;

    const FORECAST: &str = r#"{
        "cod": "200",
        "cnt": 2,
        "list": [
            {
                "dt": 1700000000,
                "main": {"temp": 11.6, "feels_like": 10.2, "temp_min": 10.9, "temp_max": 11.6,
                         "pressure": 1016, "humidity": 71},
                "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
                "clouds": {"all": 75},
                "wind": {"speed": 4.1, "deg": 250, "gust": 6.2},
                "visibility": 10000,
                "pop": 0.12,
                "dt_txt": "2023-11-14 22:13:20"
            },
            {
                "dt": 1700010800,
                "main": {"temp": 9.0, "feels_like": 7.5, "temp_min": 9.0, "temp_max": 9.0,
                         "pressure": 1017, "humidity": 80},
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10n"}],
                "wind": {"speed": 3.0, "deg": 240}
            }
        ],
        "city": {
            "id": 5391959,
            "name": "San Francisco",
            "coord": {"lat": 37.7749, "lon": -122.4194},
            "country": "US",
            "population": 805235,
            "timezone": -28800,
            "sunrise": 1699973000,
            "sunset": 1700010000
        }
    }"#;

    const AIR: &str = r#"{
        "coord": {"lon": -122.4194, "lat": 37.7749},
        "list": [
            {
                "main": {"aqi": 2},
                "components": {"co": 230.3, "no": 0.1, "no2": 12.5, "o3": 61.2,
                               "so2": 1.3, "pm2_5": 9.3, "pm10": 14.8, "nh3": 0.4},
                "dt": 1700000000
            }
        ]
    }"#;

    #[test]
    fn test_forecast_deserialize() {
        let forecast: Forecast = serde_json::from_str(FORECAST).unwrap();
        assert_eq!(forecast.city.name, "San Francisco");
        assert_eq!(forecast.city.timezone, -28800);
        assert_eq!(forecast.list.len(), 2);

        let current = forecast.current().unwrap();
        assert_eq!(current.conditions().unwrap().main, "Clouds");
        assert_eq!(current.visibility, Some(10000));
        assert_eq!(current.main.uvi, None);

        let later = &forecast.list[1];
        assert_eq!(later.visibility, None);
        assert_eq!(later.clouds.all, 0);
        assert_eq!(later.pop, 0.0);
    }

    #[test]
    fn test_air_pollution_deserialize() {
        let air: AirPollution = serde_json::from_str(AIR).unwrap();
        let sample = &air.list[0];
        assert_eq!(sample.main.aqi, 2);
        assert_eq!(sample.components.pm2_5, Some(9.3));
        assert_eq!(sample.components.pm10, 14.8);

        let missing: AirPollution =
            serde_json::from_str(r#"{"list":[{"main":{"aqi":4},"components":{"co":1.0},"dt":0}]}"#)
                .unwrap();
        assert_eq!(missing.list[0].components.pm2_5, None);
    }

    #[test]
    fn test_query_params() {
        assert_eq!(
            query_params(&Query::City("Oslo".into())),
            vec![("q", "Oslo".to_string())]
        );
        assert_eq!(
            query_params(&Query::Coordinates { lat: 59.9, lon: -10.75 }),
            vec![("lat", "59.9".to_string()), ("lon", "-10.75".to_string())]
        );
    }
}
