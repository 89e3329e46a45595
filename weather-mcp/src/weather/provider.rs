//! Response shape of the wttr.in `format=j1` endpoint, limited to the fields the
//! summary needs.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderReport {
    #[serde(default)]
    pub current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentCondition {
    #[serde(rename = "temp_F")]
    pub temp_f: Reading,

    #[serde(rename = "temp_C")]
    pub temp_c: Reading,

    #[serde(rename = "weatherDesc", default)]
    pub weather_desc: Vec<WeatherDescription>,

    pub humidity: Reading,

    #[serde(rename = "windspeedMiles")]
    pub windspeed_miles: Reading,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherDescription {
    pub value: String,
}

/// A provider reading, rendered exactly as received
///
/// wttr.in sends every reading as a string; plain JSON numbers are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}
