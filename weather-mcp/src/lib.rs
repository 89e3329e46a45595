//! # weather-mcp
//!
//! A Model Context Protocol (MCP) server with a single tool, `get_weather`, which
//! looks up current conditions for a city on wttr.in.
//!
//! The crate carries the small amount of MCP machinery the tool needs:
//!
//! - [`message`]: JSON-RPC 2.0 envelopes and MCP payloads
//! - [`transport`]: newline-delimited JSON over stdio (or any byte stream)
//! - [`tool`]: the [`Tool`](tool::Tool) and [`ToolHandler`](tool::ToolHandler) traits
//!   and the [`ToolRegistry`](tool::ToolRegistry)
//! - [`server`]: the request loop
//! - [`weather`]: the weather lookup itself

extern crate self as weather_mcp;

pub mod error;
pub mod message;
pub mod server;
pub mod tool;
pub mod transport;
pub mod weather;

pub use error::{RegistryError, ToolError, ValidationError};
pub use server::{McpServer, ServerConfig};
pub use tool::{Tool, ToolHandler, ToolRegistry, Validate};
pub use transport::{StdioTransport, Transport};
pub use weather_mcp_macros::tool;

/// Re-exports used by code generated by the `#[tool]` attribute
#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use serde_json;
}
