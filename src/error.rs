//! Error types for data acquisition and settings

use thiserror::Error;

/// Result type alias for fallible dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised around the AQI engine. The engine itself never fails.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or HTTP status failure talking to the provider
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered 404 for the requested location
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Live mode requested without a key
    #[error("An API key is required for live data")]
    MissingApiKey,

    /// Provider returned a forecast with no entries
    #[error("Provider returned an empty forecast for {0}")]
    EmptyForecast(String),

    /// Reading or writing the settings file failed
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON for the expected shape
    #[error("Settings format error: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}

impl Error {
    /// Worth repeating the request once.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.is_request()
                    || err.status().is_some_and(|status| status.is_server_error())
            }
            _ => false,
        }
    }
}
