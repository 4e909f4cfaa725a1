//! Tool registry and the built-in tool set (spec §4.3).

pub mod contract;
pub mod error;
pub mod registry;
pub mod tools;

pub use contract::{AgentTool, ToolDescriptor};
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use tools::{DataAnalysisTool, ExecutePythonTool, FileReadTool, FileWriteTool, KnowledgeBaseSearchTool, WebSearchTool};
