use async_trait::async_trait;
use weather_mcp_macros::tool;

use super::{WeatherClient, WeatherError, WeatherQuery, WeatherSummary};
use crate::error::ToolError;
use crate::message::CallToolResult;
use crate::tool::{ToolHandler, text_content};

/// The `get_weather` tool
#[tool(
    name = "get_weather",
    title = "Weather Tool",
    description = "Get current weather for a city"
)]
#[derive(Debug, Clone)]
pub struct WeatherTool {
    client: WeatherClient,
}

impl WeatherTool {
    #[must_use]
    pub const fn new(client: WeatherClient) -> Self {
        Self { client }
    }

    /// Look up current conditions for an already validated query
    ///
    /// # Errors
    ///
    /// See [`WeatherClient::current_conditions`].
    pub async fn lookup(&self, query: &WeatherQuery) -> Result<WeatherSummary, WeatherError> {
        self.client.current_conditions(&query.city).await
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    type Input = WeatherQuery;

    async fn handle(&self, input: Self::Input) -> Result<CallToolResult, ToolError> {
        let summary = self.lookup(&input).await.map_err(ToolError::failed)?;
        let text = serde_json::to_string_pretty(&summary).map_err(ToolError::failed)?;

        Ok(CallToolResult {
            content: vec![text_content(text)],
            is_error: false,
        })
    }
}
