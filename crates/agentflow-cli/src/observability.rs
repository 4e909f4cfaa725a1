//! Tracing init (ambient logging stack), grounded on
//! `skilllite/src/observability.rs`'s `init_tracing`: an `EnvFilter`
//! defaulting to `info`, honoring `RUST_LOG` if set, with quieter output
//! under `AGENTFLOW_QUIET`.

use std::env;

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize the global tracing subscriber. Call once at process startup.
pub fn init_tracing() {
    let default_level = if is_quiet() { "agentflow=warn" } else { "agentflow=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_thread_ids(false))
        .try_init();
}

fn is_quiet() -> bool {
    env::var("AGENTFLOW_QUIET").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}
