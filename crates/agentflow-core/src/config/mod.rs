//! Unified environment-variable configuration layer.
//!
//! All env var reads are centralized here; business code consumes typed
//! configuration structs rather than calling `std::env::var` directly.
//!
//! - `loader`: `env_or`/`env_optional`/`env_bool` and friends
//! - `schema`: `LlmConfig`, `PathsConfig`, `SandboxConfig`, `GraphFeatureFlags`, `ObservabilityConfig`
//! - `env_keys`: recognized env var name constants

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_f64, env_optional, env_or, env_usize, load_dotenv, set_env_var, ScopedEnvGuard};
pub use schema::{GraphFeatureFlags, LlmConfig, ObservabilityConfig, PathsConfig, SandboxConfig, SandboxMode};
