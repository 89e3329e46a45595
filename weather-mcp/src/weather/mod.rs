//! # Weather Lookup
//!
//! The one tool this server exists for: `get_weather` takes a city name, asks
//! wttr.in for current conditions and answers with a [`WeatherSummary`] rendered
//! as pretty-printed JSON text.
//!
//! ```text
//! { "city": "London" }
//!   -> GET https://wttr.in/London?format=j1
//!   -> { "city": "London", "temperature": "59°F (15°C)", "condition": "Partly cloudy",
//!        "humidity": "72%", "wind": "8 mph" }
//! ```

mod client;
mod provider;
mod tool;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::tool::Validate;

pub use client::{DEFAULT_BASE_URL, WeatherClient, WeatherConfig, WeatherError};
pub use provider::{CurrentCondition, ProviderReport, Reading, WeatherDescription};
pub use tool::WeatherTool;

/// Input of the `get_weather` tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeatherQuery {
    /// City name (e.g., "San Francisco")
    #[schemars(length(min = 1))]
    pub city: String,
}

impl Validate for WeatherQuery {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.city.trim().is_empty() {
            return Err(ValidationError::new("city", "must not be empty"));
        }
        Ok(())
    }
}

/// Current conditions for one city, every field ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub city: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind: String,
}

impl WeatherSummary {
    /// Reshape a provider report
    ///
    /// `city` is kept verbatim. Only the first entry of `current_condition` and of
    /// its `weatherDesc` are used.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::MissingField`] if either list is empty.
    pub fn from_report(city: &str, report: ProviderReport) -> Result<Self, WeatherError> {
        let current = report
            .current_condition
            .into_iter()
            .next()
            .ok_or(WeatherError::MissingField("current_condition[0]"))?;

        let condition = current
            .weather_desc
            .into_iter()
            .next()
            .ok_or(WeatherError::MissingField("current_condition[0].weatherDesc[0]"))?
            .value;

        Ok(Self {
            city: city.to_string(),
            temperature: format!("{}°F ({}°C)", current.temp_f, current.temp_c),
            condition,
            humidity: format!("{}%", current.humidity),
            wind: format!("{} mph", current.windspeed_miles),
        })
    }
}
