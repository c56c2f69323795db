//! Tool-server transport: stdio JSON-RPC framing, request correlation, the
//! single-flight connection lifecycle and tool result handling.

mod arguments;
mod catalog;
mod connection;
mod correlator;
mod error;
mod framing;
mod interface;
mod normalizer;
mod session;

pub use arguments::ToolArguments;
pub use catalog::{KnownTool, tool_catalog};
pub use connection::Connection;
pub use correlator::Correlator;
pub use error::{ArgumentError, TransportError};
pub use framing::{Inbound, LineFramer, OutboundRequest, RpcError, is_fatal_diagnostic};
pub use interface::ToolServerInterface;
pub use normalizer::{ToolResult, normalize};
pub use session::{ConnectionStatus, McpSession};
