//! Draft Assistant
//!
//! Tool boundary over the template retrieval service: typed tool
//! definitions, JSON dispatch and structured errors, plus the concurrent
//! batch runner used by the command-line front end.

pub mod batch;
pub mod error;
pub mod server;
pub mod tools;

pub use error::ToolError;
pub use server::DraftAssistant;
pub use tools::{call_tool, get_tool_definitions, handle_tool_call, Tool};
