use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, info};

use super::WeatherSummary;
use super::provider::ProviderReport;

pub const DEFAULT_BASE_URL: &str = "https://wttr.in";

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped in the city segment.
const CITY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Settings for the outbound weather provider
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Provider endpoint; the city is appended as one path segment
    pub base_url: String,

    pub user_agent: String,

    /// Whole-request timeout. `None` leaves it to the HTTP client's defaults.
    pub timeout: Option<Duration>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("weather-mcp/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid weather provider URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Weather request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Weather provider returned {status} for {url}")]
    Status { status: StatusCode, url: Url },

    #[error("Failed to parse weather provider response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Weather provider response is missing {0}")]
    MissingField(&'static str),
}

/// HTTP client for the weather provider
///
/// Cheap to share: the inner `reqwest::Client` pools connections and is safe for
/// concurrent use.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: Url,
}

impl WeatherClient {
    /// # Errors
    ///
    /// Fails if the base URL cannot have path segments appended or the HTTP
    /// client cannot be built.
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| WeatherError::InvalidBaseUrl(config.base_url.clone()))?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(WeatherError::Client)?;

        Ok(Self { http, base_url })
    }

    /// The provider URL for a city: `<base>/<percent-encoded city>?format=j1`
    #[must_use]
    pub fn request_url(&self, city: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            utf8_percent_encode(city, CITY_SEGMENT)
        );
        url.set_path(&path);
        url.set_query(Some("format=j1"));
        url
    }

    /// Fetch current conditions for a city
    ///
    /// Makes exactly one request. Nothing is retried and no partial summary is
    /// produced.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-success status, undecodable body or missing
    /// field fails the lookup.
    pub async fn current_conditions(&self, city: &str) -> Result<WeatherSummary, WeatherError> {
        let url = self.request_url(city);
        debug!("Fetching weather from {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(WeatherError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status { status, url });
        }

        let body = response.text().await.map_err(WeatherError::Request)?;
        let report: ProviderReport = serde_json::from_str(&body).map_err(WeatherError::Decode)?;

        let summary = WeatherSummary::from_report(city, report)?;
        info!("Weather for {}: {}, {}", city, summary.temperature, summary.condition);
        Ok(summary)
    }
}
