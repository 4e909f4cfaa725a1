pub mod data_analysis;
pub mod execute_python;
pub mod file_ops;
pub mod knowledge_base_search;
pub mod web_search;

pub use data_analysis::DataAnalysisTool;
pub use execute_python::ExecutePythonTool;
pub use file_ops::{FileReadTool, FileWriteTool};
pub use knowledge_base_search::KnowledgeBaseSearchTool;
pub use web_search::WebSearchTool;
