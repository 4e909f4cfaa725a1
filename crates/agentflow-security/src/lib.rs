//! Security gates composed on every tool invocation (spec §4.4): permission
//! check, input content filter, (sandboxing lives in `agentflow-sandbox`),
//! output content filter, and path containment.

pub mod content_filter;
pub mod error;
pub mod path_containment;
pub mod permissions;

pub use content_filter::{ContentFilter, FilterAction, FilterResult};
pub use error::SecurityError;
pub use path_containment::validate_path_under_root;
pub use permissions::{
    default_tool_permissions, Approval, ApprovalStore, InMemoryApprovalStore, PermissionCheckResult, PermissionChecker,
    ToolPermission, UserRole,
};
