//! Structured logging setup.
//!
//! - `RUST_LOG` filter, default `vigil=info`
//! - JSON lines when `VIGIL_LOG_FORMAT=json`
//! - always stderr, so stdout stays free for snapshots

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "vigil=info,vigil_core=info,vigil_cli=info";

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_json = std::env::var("VIGIL_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
