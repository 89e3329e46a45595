//! # Tool System for MCP
//!
//! This module provides the abstractions for defining tools and exposing them to
//! an MCP host.
//!
//! ## Tool Traits
//!
//! - [`Tool`]: The object-safe trait the registry stores and the server calls
//! - [`ToolHandler`]: A trait for handling tool calls with a strongly typed input
//! - [`Validate`]: Checks an input beyond what its type already guarantees
//!
//! The `#[tool(...)]` attribute macro connects the two: it implements [`Tool`]
//! for any struct that implements [`ToolHandler`], deriving the input schema from the
//! handler's input type and validating arguments before the handler runs.
//!
//! ## Registry
//!
//! - [`ToolRegistry`]: Owns the registered tools, rejects malformed registrations,
//!   lists tool definitions and dispatches calls by name

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{RegistryError, ToolError, ValidationError};
use crate::message::{CallToolResult, Content, ToolDefinition};

const MAX_TOOL_NAME_LEN: usize = 128;

/// Trait representing a tool that can be called via MCP
///
/// Most tools should not implement this by hand; implement [`ToolHandler`] and
/// apply the `#[tool(...)]` attribute instead.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    ///
    /// The name must be unique within a registry.
    fn name(&self) -> &str;

    /// Optional display name shown by hosts
    fn title(&self) -> Option<&str> {
        None
    }

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's input
    fn input_schema(&self) -> Value;

    /// Call the tool with the given arguments
    ///
    /// The arguments are untrusted JSON from the host and must be validated
    /// against the tool's input contract before any work is done.
    async fn call(&self, args: Value) -> Result<CallToolResult, ToolError>;
}

/// Trait for handling tool calls with a strongly typed input
#[async_trait]
pub trait ToolHandler {
    /// The input type for this tool
    type Input: DeserializeOwned + JsonSchema + Validate + Send;

    /// Handle a tool call with an input that already passed validation
    async fn handle(&self, input: Self::Input) -> Result<CallToolResult, ToolError>;
}

/// Semantic checks on a deserialized tool input
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Build the JSON schema advertised for an input type
#[must_use]
pub fn input_schema<I: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(I);
    serde_json::to_value(schema).unwrap_or_default()
}

/// Deserialize and validate tool arguments
///
/// # Errors
///
/// Returns [`ToolError::InvalidArguments`] if the arguments do not deserialize into `I`
/// or if `I::validate` rejects them.
pub fn parse_input<I>(tool: &str, args: Value) -> Result<I, ToolError>
where
    I: DeserializeOwned + Validate,
{
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };

    let input: I = serde_json::from_value(args).map_err(|e| invalid(e.to_string()))?;
    input.validate().map_err(|e| invalid(e.to_string()))?;
    Ok(input)
}

/// Create text content for tool responses
#[must_use]
pub fn text_content(text: impl Into<String>) -> Content {
    Content::text(text)
}

/// A registry for managing available tools
///
/// The registry is built once at startup and then shared read-only by the server.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool with the registry
    ///
    /// # Errors
    ///
    /// Fails if the tool's name is invalid or already taken, or if its input
    /// schema does not describe a JSON object.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        validate_tool_name(&name)?;

        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }

        validate_input_schema(&tool.input_schema()).map_err(|reason| {
            RegistryError::InvalidSchema {
                tool: name.clone(),
                reason,
            }
        })?;

        debug!("Registered tool '{}'", name);
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    /// Call a tool by name with the given arguments
    ///
    /// Missing arguments are treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for an unknown name, otherwise whatever the tool returns.
    pub async fn call_tool(
        &self,
        name: &str,
        args: Option<Value>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let args = args.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        tool.call(args).await
    }

    /// List all registered tools, ordered by name
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                title: tool.title().map(ToString::to_string),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_tool_name(name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_TOOL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}

fn validate_input_schema(schema: &Value) -> Result<(), String> {
    let object = schema
        .as_object()
        .ok_or_else(|| "schema must be a JSON object".to_string())?;

    if object.get("type").and_then(Value::as_str) != Some("object") {
        return Err("schema type must be \"object\"".to_string());
    }

    let properties = match object.get("properties") {
        None => None,
        Some(Value::Object(properties)) => Some(properties),
        Some(_) => return Err("\"properties\" must be an object".to_string()),
    };

    let Some(required) = object.get("required") else {
        return Ok(());
    };
    let required = required
        .as_array()
        .ok_or_else(|| "\"required\" must be an array".to_string())?;

    for field in required {
        let field = field
            .as_str()
            .ok_or_else(|| "\"required\" entries must be strings".to_string())?;
        if !properties.is_some_and(|p| p.contains_key(field)) {
            return Err(format!("required field '{field}' is not declared in properties"));
        }
    }

    Ok(())
}
