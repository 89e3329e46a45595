//! # MCP Server Implementation
//!
//! This module provides the server side of the Model Context Protocol (MCP): it
//! reads JSON-RPC requests from a [`Transport`], dispatches them against a
//! [`ToolRegistry`] and writes the responses back.
//!
//! ## Server Architecture
//!
//! 1. The host spawns the process and connects over stdio
//! 2. The host initializes the session with `initialize`
//! 3. The host lists the available tools and calls them
//! 4. Each request is answered independently; tool calls run concurrently
//!    with reading further requests
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use weather_mcp::{
//!     server::{McpServer, ServerConfig},
//!     tool::ToolRegistry,
//!     transport::StdioTransport,
//! };
//! use eyre::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = ToolRegistry::new();
//!     let server = McpServer::new(ServerConfig::default(), registry);
//!     server.serve(StdioTransport::new()).await
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use eyre::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::message::{
    CallToolParams, CallToolResult, ErrorData, Implementation, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, RequestId, SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities,
    ToolsCapability, error_codes,
};
use crate::tool::ToolRegistry;
use crate::transport::Transport;

/// Server configuration
///
/// Identity the server reports to the host during `initialize`.
///
/// # Examples
///
/// ```rust
/// use weather_mcp::server::ServerConfig;
///
/// let config = ServerConfig {
///     name: "my-server".to_string(),
///     title: None,
///     version: "0.1.0".to_string(),
///     instructions: None,
/// };
///
/// // Or use the default configuration
/// let default_config = ServerConfig::default();
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name
    pub name: String,

    /// Human-readable display name
    pub title: Option<String>,

    /// Server version
    pub version: String,

    /// Usage hints passed to the host's model
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    /// - Name: "weather-server"
    /// - Title: "Weather Server"
    /// - Version: The crate version
    fn default() -> Self {
        Self {
            name: "weather-server".to_string(),
            title: Some("Weather Server".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
        }
    }
}

type PendingResponse<'a> = Pin<Box<dyn Future<Output = Option<JsonRpcMessage>> + Send + 'a>>;

/// MCP Server
///
/// Owns the configuration and the tool registry for the lifetime of the process.
pub struct McpServer {
    config: ServerConfig,
    registry: ToolRegistry,
}

impl McpServer {
    /// Create a new MCP server with the given configuration and tool registry
    #[must_use]
    pub const fn new(config: ServerConfig, registry: ToolRegistry) -> Self {
        Self { config, registry }
    }

    /// Serve requests from the transport until the peer closes it
    ///
    /// Requests are handled concurrently; responses are written in completion
    /// order. Once the input ends, in-flight requests are finished and their
    /// responses written before this returns.
    ///
    /// # Errors
    ///
    /// Fails if the transport cannot be read from or written to. Malformed
    /// messages are answered with JSON-RPC errors and do not stop the server.
    pub async fn serve<T: Transport>(&self, mut transport: T) -> Result<()> {
        info!(
            "MCP server '{}' v{} serving {} tool(s)",
            self.config.name,
            self.config.version,
            self.registry.len()
        );

        let mut pending: FuturesUnordered<PendingResponse<'_>> = FuturesUnordered::new();
        let mut input_open = true;

        while input_open || !pending.is_empty() {
            tokio::select! {
                incoming = transport.read_message(), if input_open => {
                    match incoming {
                        Ok(Some(message)) => {
                            if let Some(response) = self.accept(message) {
                                pending.push(response);
                            }
                        }
                        Ok(None) => {
                            debug!("Transport closed, draining {} pending request(s)", pending.len());
                            input_open = false;
                        }
                        Err(e) => match e.downcast_ref::<serde_json::Error>() {
                            Some(parse_error) => {
                                warn!("Rejecting malformed message: {}", parse_error);
                                let response = Self::malformed_message(parse_error);
                                transport.write_message(&response).await?;
                            }
                            None => return Err(e),
                        },
                    }
                }
                Some(response) = pending.next(), if !pending.is_empty() => {
                    if let Some(response) = response {
                        transport.write_message(&response).await?;
                    }
                }
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Turn one incoming message into the future that produces its response
    fn accept(&self, message: JsonRpcMessage) -> Option<PendingResponse<'_>> {
        match message {
            JsonRpcMessage::Request(request) => {
                if request.is_notification() {
                    self.handle_notification(&request);
                    None
                } else {
                    Some(Box::pin(self.handle_message(request)))
                }
            }
            JsonRpcMessage::Response(response) => {
                debug!("Ignoring unsolicited response to request {}", response.id);
                None
            }
            JsonRpcMessage::Error(response) => {
                warn!("Host reported error: {}", response.error.message);
                None
            }
        }
    }

    /// Handle an incoming request
    ///
    /// Dispatches the request by method and wraps the outcome in a JSON-RPC
    /// response carrying the request's id.
    pub async fn handle_message(&self, request: JsonRpcRequest) -> Option<JsonRpcMessage> {
        let id = request.id?;
        debug!("Received request {}: {}", id, request.method);

        let outcome = match request.method.as_str() {
            "initialize" => parse_params(request.params)
                .and_then(|params| to_value(self.handle_initialize(params))),
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            "tools/list" => to_value(self.handle_list_tools()),
            "tools/call" => match parse_params(request.params) {
                Ok(params) => self.handle_call_tool(params).await,
                Err(e) => Err(e),
            },
            method => {
                warn!("Unsupported method: {}", method);
                Err(ErrorData::new(
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                ))
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(id, result)),
            Err(error) => JsonRpcMessage::Error(JsonRpcError::new(Some(id), error)),
        })
    }

    fn handle_notification(&self, notification: &JsonRpcRequest) {
        match notification.method.as_str() {
            "notifications/initialized" => info!("Host finished initialization"),
            method => debug!("Ignoring notification: {}", method),
        }
    }

    /// Handle an initialize request
    ///
    /// Echoes the host's protocol version when it is supported and offers the
    /// newest supported version otherwise.
    fn handle_initialize(&self, params: InitializeParams) -> InitializeResult {
        let requested = params.protocol_version.as_str();
        let protocol_version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
            params.protocol_version.clone()
        } else {
            warn!(
                "Host requested unsupported protocol version {}, offering {}",
                params.protocol_version, SUPPORTED_PROTOCOL_VERSIONS[0]
            );
            SUPPORTED_PROTOCOL_VERSIONS[0].to_string()
        };

        match &params.client_info {
            Some(client) => info!(
                "Initializing session with {} v{} (protocol {})",
                client.name, client.version, protocol_version
            ),
            None => info!("Initializing session (protocol {})", protocol_version),
        }

        InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: Implementation {
                name: self.config.name.clone(),
                title: self.config.title.clone(),
                version: self.config.version.clone(),
            },
            instructions: self.config.instructions.clone(),
        }
    }

    /// Handle a call tool request
    ///
    /// Argument and lookup failures become JSON-RPC errors; failures inside the
    /// tool become a result flagged with `isError` so the host can show them to
    /// its model.
    async fn handle_call_tool(&self, params: CallToolParams) -> Result<Value, ErrorData> {
        info!("Calling tool: {}", params.name);

        let result = match self.registry.call_tool(&params.name, params.arguments).await {
            Ok(result) => result,
            Err(e) if e.is_invalid_params() => {
                warn!("Rejected tool call: {}", e);
                return Err(ErrorData::new(error_codes::INVALID_PARAMS, e.to_string()));
            }
            Err(e) => {
                error!("Tool call error: {}", e);
                CallToolResult::error(e.to_string())
            }
        };

        to_value(result)
    }

    /// Handle a list tools request
    fn handle_list_tools(&self) -> ListToolsResult {
        debug!("Listing tools");
        ListToolsResult {
            tools: self.registry.list_tools(),
        }
    }

    fn malformed_message(error: &serde_json::Error) -> JsonRpcMessage {
        let error = if error.is_data() {
            ErrorData::new(
                error_codes::INVALID_REQUEST,
                format!("Invalid request: {error}"),
            )
        } else {
            ErrorData::new(error_codes::PARSE_ERROR, format!("Parse error: {error}"))
        };
        JsonRpcMessage::Error(JsonRpcError::new(None, error))
    }
}

fn parse_params<P: DeserializeOwned>(params: Option<Value>) -> Result<P, ErrorData> {
    let params = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(params).map_err(|e| {
        ErrorData::new(error_codes::INVALID_PARAMS, format!("Invalid params: {e}"))
    })
}

fn to_value<T: serde::Serialize>(result: T) -> Result<Value, ErrorData> {
    serde_json::to_value(result)
        .map_err(|e| ErrorData::new(error_codes::INTERNAL_ERROR, e.to_string()))
}
