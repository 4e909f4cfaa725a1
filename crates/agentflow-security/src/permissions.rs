//! Permission gate (spec §4.4 step 1).
//!
//! Grounded on `examples/original_source/backend/airbeeps/agents/security/permissions.py`:
//! role-based tool access, usage quotas (hourly/daily, lazily rolled over),
//! and an approval requirement for high-risk tools. The approval table itself
//! is a narrow trait (`ApprovalStore`) rather than the original's SQLAlchemy
//! session, since persistence is out of scope (spec §1) — an in-memory
//! implementation is provided for tests and for a single-process deployment.

use std::collections::HashMap;
use std::sync::Arc;

use agentflow_core::SecurityLevel;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// User role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserRole {
    Guest,
    User,
    PowerUser,
    Admin,
    Superuser,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::User => "user",
            UserRole::PowerUser => "power_user",
            UserRole::Admin => "admin",
            UserRole::Superuser => "superuser",
        }
    }
}

/// Permission configuration for one tool.
#[derive(Debug, Clone)]
pub struct ToolPermission {
    pub tool_name: String,
    pub security_level: SecurityLevel,
    pub allowed_roles: Vec<UserRole>,
    pub requires_approval: bool,
    pub max_calls_per_hour: u32,
    pub max_calls_per_day: u32,
    pub cost_per_call: f64,
}

impl ToolPermission {
    fn new(tool_name: &str, security_level: SecurityLevel, allowed_roles: Vec<UserRole>) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            security_level,
            allowed_roles,
            requires_approval: false,
            max_calls_per_hour: 100,
            max_calls_per_day: 1000,
            cost_per_call: 0.0,
        }
    }

    fn with_hourly(mut self, n: u32) -> Self {
        self.max_calls_per_hour = n;
        self
    }

    fn with_daily(mut self, n: u32) -> Self {
        self.max_calls_per_day = n;
        self
    }

    fn requiring_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

/// Default tool permission table, ported 1:1 from the original's
/// `DEFAULT_TOOL_PERMISSIONS`.
pub fn default_tool_permissions() -> HashMap<String, ToolPermission> {
    use SecurityLevel::*;
    use UserRole::*;
    let all_roles = vec![Guest, User, PowerUser, Admin, Superuser];
    let user_and_up = vec![User, PowerUser, Admin, Superuser];
    let power_user_and_up = vec![PowerUser, Admin, Superuser];
    let admin_and_up = vec![Admin, Superuser];

    let mut table = HashMap::new();
    table.insert(
        "knowledge_base_search".to_string(),
        ToolPermission::new("knowledge_base_search", Safe, all_roles.clone()).with_hourly(200),
    );
    table.insert("web_search".to_string(), ToolPermission::new("web_search", Safe, user_and_up.clone()).with_hourly(50));
    table.insert(
        "file_read".to_string(),
        ToolPermission::new("file_read", Moderate, user_and_up.clone()).with_hourly(100),
    );
    table.insert(
        "data_analysis".to_string(),
        ToolPermission::new("data_analysis", Moderate, user_and_up.clone()).with_hourly(50),
    );
    table.insert(
        "execute_python".to_string(),
        ToolPermission::new("execute_python", Dangerous, power_user_and_up.clone()).with_hourly(20).with_daily(100),
    );
    table.insert(
        "file_write".to_string(),
        ToolPermission::new("file_write", Dangerous, power_user_and_up).with_hourly(50),
    );
    table.insert(
        "sql_execute".to_string(),
        ToolPermission::new("sql_execute", Critical, admin_and_up.clone()).with_hourly(20).requiring_approval(),
    );
    table.insert(
        "system_command".to_string(),
        ToolPermission::new("system_command", Critical, vec![Superuser]).with_hourly(10).requiring_approval(),
    );
    table
}

fn default_permission_for_unknown(tool_name: &str) -> ToolPermission {
    ToolPermission::new(tool_name, SecurityLevel::Moderate, vec![UserRole::User, UserRole::PowerUser, UserRole::Admin, UserRole::Superuser])
}

/// A grant of approval for `(user, tool)`.
#[derive(Debug, Clone)]
pub struct Approval {
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining_uses: Option<u32>,
}

impl Approval {
    pub fn is_valid(&self) -> bool {
        let not_expired = self.expires_at.map(|e| e > Utc::now()).unwrap_or(true);
        let has_uses = self.remaining_uses.map(|n| n > 0).unwrap_or(true);
        not_expired && has_uses
    }
}

/// Approval store contract; `InMemoryApprovalStore` is the only
/// implementation shipped here (spec §1: persistence out of scope).
pub trait ApprovalStore: Send + Sync {
    fn check(&self, user_id: &str, tool_name: &str) -> Option<Approval>;
    fn consume(&self, user_id: &str, tool_name: &str) -> bool;
    fn grant(&self, user_id: &str, tool_name: &str, approval: Approval);
}

#[derive(Default)]
pub struct InMemoryApprovalStore {
    grants: std::sync::Mutex<HashMap<(String, String), Approval>>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApprovalStore for InMemoryApprovalStore {
    fn check(&self, user_id: &str, tool_name: &str) -> Option<Approval> {
        let grants = self.grants.lock().unwrap();
        grants.get(&(user_id.to_string(), tool_name.to_string())).filter(|a| a.is_valid()).cloned()
    }

    fn consume(&self, user_id: &str, tool_name: &str) -> bool {
        let mut grants = self.grants.lock().unwrap();
        match grants.get_mut(&(user_id.to_string(), tool_name.to_string())) {
            Some(a) if a.is_valid() => {
                if let Some(n) = a.remaining_uses.as_mut() {
                    *n -= 1;
                }
                true
            }
            _ => false,
        }
    }

    fn grant(&self, user_id: &str, tool_name: &str, approval: Approval) {
        self.grants.lock().unwrap().insert((user_id.to_string(), tool_name.to_string()), approval);
    }
}

/// Per-(user, tool) usage counters, reset lazily on read.
#[derive(Debug, Clone)]
struct UsageQuota {
    calls_this_hour: u32,
    calls_today: u32,
    hour_reset_time: DateTime<Utc>,
    day_reset_time: DateTime<Utc>,
    total_cost: f64,
}

impl Default for UsageQuota {
    fn default() -> Self {
        let now = Utc::now();
        Self { calls_this_hour: 0, calls_today: 0, hour_reset_time: now, day_reset_time: now, total_cost: 0.0 }
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone)]
pub struct PermissionCheckResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub warning: Option<String>,
}

impl PermissionCheckResult {
    fn allow() -> Self {
        Self { allowed: true, reason: None, warning: None }
    }

    fn allow_with_warning(warning: String) -> Self {
        Self { allowed: true, reason: None, warning: Some(warning) }
    }

    fn deny(reason: String) -> Self {
        Self { allowed: false, reason: Some(reason), warning: None }
    }
}

/// Checks role, approval, and quota gates for tool invocation (spec §4.4 step 1).
pub struct PermissionChecker {
    permissions: HashMap<String, ToolPermission>,
    approval_store: Arc<dyn ApprovalStore>,
    usage: Mutex<HashMap<(String, String), UsageQuota>>,
    audit_log_enabled: bool,
}

impl PermissionChecker {
    pub fn new(custom_permissions: HashMap<String, ToolPermission>, approval_store: Arc<dyn ApprovalStore>) -> Self {
        let mut permissions = default_tool_permissions();
        permissions.extend(custom_permissions);
        Self { permissions, approval_store, usage: Mutex::new(HashMap::new()), audit_log_enabled: true }
    }

    pub fn get_tool_permission(&self, tool_name: &str) -> ToolPermission {
        self.permissions.get(tool_name).cloned().unwrap_or_else(|| default_permission_for_unknown(tool_name))
    }

    pub fn get_allowed_tools(&self, role: UserRole) -> Vec<String> {
        self.permissions
            .values()
            .filter(|p| p.allowed_roles.contains(&role))
            .map(|p| p.tool_name.clone())
            .collect()
    }

    /// `can_use_tool(user, tool_name)` (spec §4.4 step 1).
    pub async fn can_use_tool(&self, user_id: &str, role: UserRole, tool_name: &str, check_quota: bool) -> PermissionCheckResult {
        let permission = self.get_tool_permission(tool_name);

        if self.audit_log_enabled {
            tracing::info!(user = user_id, tool = tool_name, role = role.as_str(), level = ?permission.security_level, "permission check");
        }

        if !permission.allowed_roles.contains(&role) {
            let reason = format!(
                "tool '{tool_name}' requires role in {:?}, but user has role '{}'",
                permission.allowed_roles,
                role.as_str()
            );
            tracing::warn!(user = user_id, tool = tool_name, reason = %reason, "permission denied");
            return PermissionCheckResult::deny(reason);
        }

        if permission.requires_approval && role != UserRole::Superuser {
            match self.approval_store.check(user_id, tool_name) {
                Some(_) => {}
                None => return PermissionCheckResult::deny(format!("tool '{tool_name}' requires approval")),
            }
        }

        if check_quota {
            let quota_result = self.check_quota(user_id, tool_name, &permission).await;
            if !quota_result.allowed {
                return quota_result;
            }
        }

        if matches!(permission.security_level, SecurityLevel::Dangerous | SecurityLevel::Critical) {
            return PermissionCheckResult::allow_with_warning(format!(
                "tool '{tool_name}' has security level '{:?}'",
                permission.security_level
            ));
        }

        PermissionCheckResult::allow()
    }

    async fn check_quota(&self, user_id: &str, tool_name: &str, permission: &ToolPermission) -> PermissionCheckResult {
        let mut usage = self.usage.lock().await;
        let key = (user_id.to_string(), tool_name.to_string());
        let quota = usage.entry(key).or_default();
        let now = Utc::now();

        if now - quota.hour_reset_time > Duration::hours(1) {
            quota.calls_this_hour = 0;
            quota.hour_reset_time = now;
        }
        if now - quota.day_reset_time > Duration::days(1) {
            quota.calls_today = 0;
            quota.day_reset_time = now;
        }

        if quota.calls_this_hour >= permission.max_calls_per_hour {
            return PermissionCheckResult::deny(format!("hourly limit reached ({} calls/hour)", permission.max_calls_per_hour));
        }
        if quota.calls_today >= permission.max_calls_per_day {
            return PermissionCheckResult::deny(format!("daily limit reached ({} calls/day)", permission.max_calls_per_day));
        }
        PermissionCheckResult::allow()
    }

    /// Record a completed call against the quota (spec §4.5 step 6 feeds this).
    pub async fn record_usage(&self, user_id: &str, tool_name: &str, cost: f64) {
        let mut usage = self.usage.lock().await;
        let quota = usage.entry((user_id.to_string(), tool_name.to_string())).or_default();
        quota.calls_this_hour += 1;
        quota.calls_today += 1;
        quota.total_cost += cost;
    }
}
