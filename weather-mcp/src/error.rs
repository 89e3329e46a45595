use thiserror::Error;

/// Failure of a single tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Arguments did not match the tool's input contract. The handler never ran.
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The handler ran and failed
    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl ToolError {
    pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(error.into())
    }

    /// Whether this failure happened before the handler was reached
    #[must_use]
    pub const fn is_invalid_params(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidArguments { .. })
    }
}

/// Startup failure while registering a tool
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid tool name '{0}': expected 1-128 characters of [A-Za-z0-9_.-]")]
    InvalidName(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Invalid input schema for tool '{tool}': {reason}")]
    InvalidSchema { tool: String, reason: String },
}

/// A rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
