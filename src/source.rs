//! Demo or live acquisition of a dashboard snapshot.

use chrono::Utc;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::aqi::{self, AqiResult};
use crate::config::Settings;
use crate::demo::{self, DemoSource};
use crate::error::{Error, Result};
use crate::owm::air_pollution::{AirPollution, Sample};
use crate::owm::{self, forecast::Forecast};
use crate::units::Units;
use crate::weather::{Mode, Query, Snapshot};

/// OpenWeatherMap backed source.
#[derive(Debug)]
pub struct LiveSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LiveSource {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, owm::BASE_URL)
    }

    /// Live source talking to a provider at another API root.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        Self::with_client(owm::client()?, api_key, base_url)
    }

    pub fn with_client(client: Client, api_key: &str, base_url: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn forecast(&self, query: &Query, units: Units) -> Result<Forecast> {
        let request =
            || Forecast::from_owm(&self.client, &self.base_url, &self.api_key, query, units);
        match request() {
            Err(err) if err.is_transient() => {
                warn!(%query, error = %err, "forecast request failed, retrying once");
                request()
            }
            result => result,
        }
    }

    pub fn fetch(&self, query: &Query, units: Units) -> Result<(Forecast, AirPollution)> {
        let forecast = self.forecast(query, units)?;
        let coord = forecast.city.coord;
        let air = match AirPollution::from_owm(&self.client, &self.base_url, &self.api_key, coord) {
            Ok(air) => air,
            Err(err) => {
                warn!(error = %err, "air pollution request failed, using synthetic reading");
                demo::generate_air_pollution(&mut rand::thread_rng(), Utc::now())
            }
        };
        Ok((forecast, air))
    }
}

pub enum Source {
    Demo(DemoSource),
    Live(LiveSource),
}

impl Source {
    /// Pick the acquisition path the settings call for. A live source that
    /// cannot be built degrades to demo data.
    pub fn from_settings(settings: &Settings, seed: Option<u64>) -> Self {
        let demo = || match seed {
            Some(seed) => DemoSource::with_seed(seed),
            None => DemoSource::new(),
        };
        if settings.use_demo() {
            return Source::Demo(demo());
        }
        match LiveSource::new(settings.api_key().unwrap_or_default()) {
            Ok(live) => Source::Live(live),
            Err(err) => {
                warn!(error = %err, "live source unavailable, falling back to demo data");
                Source::Demo(demo())
            }
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Source::Demo(_) => Mode::Demo,
            Source::Live(_) => Mode::Live,
        }
    }

    pub fn fetch(&mut self, query: &Query, units: Units) -> Result<Snapshot> {
        info!(%query, mode = %self.mode(), units = units.as_param(), "fetching weather");
        let now = Utc::now();
        let (forecast, air) = match self {
            Source::Demo(demo) => (demo.forecast(query, units, now), demo.air_pollution(now)),
            Source::Live(live) => live.fetch(query, units)?,
        };
        if forecast.list.is_empty() {
            return Err(Error::EmptyForecast(forecast.city.name));
        }

        let air = air.list.into_iter().next();
        let aqi = assess_sample(air.as_ref());
        info!(
            city = %forecast.city.name,
            aqi = aqi.index,
            tier = aqi.label,
            approximate = aqi.is_approximate(),
            "weather updated"
        );

        Ok(Snapshot {
            mode: self.mode(),
            units,
            forecast,
            air,
            aqi,
            fetched_at: now,
        })
    }
}

/// AQI for the first pollution sample; PM2.5 first, coarse category second.
pub fn assess_sample(sample: Option<&Sample>) -> AqiResult {
    match sample {
        Some(sample) => aqi::assess_reading(&sample.components, Some(sample.main.aqi)),
        None => aqi::assess(None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::{IndexBasis, PollutantReading};
    use crate::owm::air_pollution::Index;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;

    /// Minimal HTTP server answering each request with `respond(path, nth)`,
    /// where `nth` counts earlier requests to the same path.
    struct StubServer {
        base_url: String,
        paths: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        fn start<F>(respond: F) -> Self
        where
            F: Fn(&str, usize) -> (u16, String) + Send + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let paths = Arc::new(Mutex::new(Vec::new()));
            let seen = Arc::clone(&paths);

            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&request);
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .and_then(|target| target.split('?').next())
                        .unwrap_or_default()
                        .to_string();

                    let nth = {
                        let mut seen = seen.lock().unwrap();
                        let nth = seen.iter().filter(|p| **p == path).count();
                        seen.push(path.clone());
                        nth
                    };
                    let (status, body) = respond(&path, nth);
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            });

            Self { base_url, paths }
        }

        fn hits(&self, path: &str) -> usize {
            self.paths.lock().unwrap().iter().filter(|p| *p == path).count()
        }

        fn source(&self) -> Source {
            let client = Client::builder().no_proxy().build().unwrap();
            Source::Live(LiveSource::with_client(client, "key", &self.base_url).unwrap())
        }
    }

    fn forecast_body() -> String {
        let query = Query::City("Lima".into());
        let forecast =
            demo::generate_forecast(&mut rand::thread_rng(), &query, Units::Metric, Utc::now());
        serde_json::to_string(&forecast).unwrap()
    }

    fn air_body() -> String {
        let air = AirPollution {
            list: vec![Sample {
                main: Index { aqi: 2 },
                components: PollutantReading {
                    pm2_5: Some(48.2),
                    ..Default::default()
                },
                dt: 0,
            }],
        };
        serde_json::to_string(&air).unwrap()
    }

    #[test]
    fn test_mode_selection() {
        let settings = Settings::default();
        assert_eq!(Source::from_settings(&settings, Some(1)).mode(), Mode::Demo);

        let settings = Settings {
            api_key: Some("key".into()),
            demo_mode: false,
            ..Default::default()
        };
        assert_eq!(Source::from_settings(&settings, None).mode(), Mode::Live);

        let settings = Settings {
            api_key: Some("key".into()),
            demo_mode: true,
            ..Default::default()
        };
        assert_eq!(Source::from_settings(&settings, None).mode(), Mode::Demo);
    }

    #[test]
    fn test_live_requires_key() {
        assert!(matches!(LiveSource::new("  "), Err(Error::MissingApiKey)));
    }

    #[test]
    fn test_demo_fetch() {
        let mut source = Source::from_settings(&Settings::default(), Some(11));
        let query = Query::City("Hanoi".into());
        let snapshot = source.fetch(&query, Units::Metric).unwrap();

        assert_eq!(snapshot.mode, Mode::Demo);
        assert_eq!(snapshot.forecast.city.name, "Hanoi");
        let sample = snapshot.air.as_ref().unwrap();
        let pm2_5 = sample.components.pm2_5.unwrap();
        assert_eq!(snapshot.aqi.index, aqi::compute_index(pm2_5));
        assert_eq!(snapshot.aqi.basis, IndexBasis::Pm25);
    }

    #[test]
    fn test_assess_sample() {
        let sample = Sample {
            main: Index { aqi: 4 },
            components: PollutantReading {
                pm2_5: None,
                ..Default::default()
            },
            dt: 0,
        };
        let result = assess_sample(Some(&sample));
        assert_eq!(result.index, 80);
        assert_eq!(result.basis, IndexBasis::CoarseIndex);

        assert_eq!(assess_sample(None).basis, IndexBasis::Unavailable);
    }

    #[test]
    fn test_live_fetch() {
        let forecast = forecast_body();
        let air = air_body();
        let server = StubServer::start(move |path, _| match path {
            "/forecast" => (200, forecast.clone()),
            _ => (200, air.clone()),
        });

        let snapshot = server
            .source()
            .fetch(&Query::City("Lima".into()), Units::Metric)
            .unwrap();
        assert_eq!(snapshot.mode, Mode::Live);
        assert_eq!(snapshot.forecast.city.name, "Lima");
        assert_eq!(snapshot.aqi.index, 132);
        assert_eq!(snapshot.aqi.basis, IndexBasis::Pm25);
        assert_eq!(server.hits("/forecast"), 1);
        assert_eq!(server.hits("/air_pollution"), 1);
    }

    #[test]
    fn test_live_retries_transient_failure_once() {
        let forecast = forecast_body();
        let air = air_body();
        let server = StubServer::start(move |path, nth| match (path, nth) {
            ("/forecast", 0) => (503, r#"{"cod":503}"#.to_string()),
            ("/forecast", _) => (200, forecast.clone()),
            _ => (200, air.clone()),
        });

        let snapshot = server
            .source()
            .fetch(&Query::City("Lima".into()), Units::Metric)
            .unwrap();
        assert_eq!(snapshot.forecast.city.name, "Lima");
        assert_eq!(server.hits("/forecast"), 2);
    }

    #[test]
    fn test_live_gives_up_after_second_failure() {
        let server = StubServer::start(|_, _| (502, r#"{"cod":502}"#.to_string()));

        let err = server
            .source()
            .fetch(&Query::City("Lima".into()), Units::Metric)
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(server.hits("/forecast"), 2);
        assert_eq!(server.hits("/air_pollution"), 0);
    }

    #[test]
    fn test_live_location_not_found_is_not_retried() {
        let server = StubServer::start(|_, _| {
            (404, r#"{"cod":"404","message":"city not found"}"#.to_string())
        });

        let err = server
            .source()
            .fetch(&Query::City("Atlantis".into()), Units::Metric)
            .unwrap_err();
        assert!(matches!(err, Error::LocationNotFound(ref name) if name == "Atlantis"));
        assert_eq!(server.hits("/forecast"), 1);
        assert_eq!(server.hits("/air_pollution"), 0);
    }

    #[test]
    fn test_live_air_failure_uses_synthetic_sample() {
        let forecast = forecast_body();
        let server = StubServer::start(move |path, _| match path {
            "/forecast" => (200, forecast.clone()),
            _ => (500, r#"{"cod":500}"#.to_string()),
        });

        let snapshot = server
            .source()
            .fetch(&Query::City("Lima".into()), Units::Metric)
            .unwrap();
        let sample = snapshot.air.as_ref().unwrap();
        let pm2_5 = sample.components.pm2_5.unwrap();
        assert!((5.0..200.0).contains(&pm2_5));
        assert_eq!(snapshot.aqi.basis, IndexBasis::Pm25);
        assert_eq!(snapshot.aqi.index, aqi::compute_index(pm2_5));
        assert_eq!(server.hits("/air_pollution"), 1);
    }
}
