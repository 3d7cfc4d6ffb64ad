// crates/federation-server/src/observability.rs
// ============================================================================
// Module: Observability
// Description: Process-wide tracing subscriber setup.
// Purpose: Install structured diagnostic logging exactly once.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! The subscriber writes formatted events to stderr. The filter comes from
//! `RUST_LOG` when set, otherwise from `logging.filter`. Initialization is
//! guarded by `OnceLock`, so repeated calls (tests, CLI subcommands) are
//! no-ops after the first.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Set once the global subscriber has been installed.
static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs the global tracing subscriber with `default_filter` as fallback.
///
/// An unparseable filter falls back to `info`.
pub fn init_tracing(default_filter: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
    });
}
