//! Tracing setup for the server binary.
//!
//! The subscriber is installed before configuration is read, so its filter
//! sits behind a reload layer and is narrowed once `logging.level` is known.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// HTTP plumbing that is too chatty below `warn`.
const QUIET_TARGETS: &str = "hyper=warn,h2=warn,reqwest=warn";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn filter_for(level: &str) -> EnvFilter {
    if level.eq_ignore_ascii_case("off") {
        return EnvFilter::new("off");
    }
    EnvFilter::new(format!("{level},{QUIET_TARGETS}"))
}

/// Installs the global subscriber at `info`; `RUST_LOG` takes over when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for("info"));
    let (filter, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Switches to the configured level unless `RUST_LOG` was given.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    if let Err(e) = handle.reload(filter_for(level)) {
        tracing::warn!(error = %e, "Failed to apply logging level");
    }
}
