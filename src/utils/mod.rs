pub mod build_info;
pub mod clock;
pub mod persistence;

use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "spese=info";

/// Installs the global tracing subscriber. `RUST_LOG` is honoured, then the
/// crate default, then `extra` (typically the configured `log_filter`).
///
/// Returns `false` when another subscriber was already installed.
pub fn init_tracing(extra: Option<&str>) -> bool {
    let mut filter = EnvFilter::from_default_env();
    let mut rejected = Vec::new();
    for directive in std::iter::once(DEFAULT_DIRECTIVE).chain(extra) {
        match directive.parse() {
            Ok(parsed) => filter = filter.add_directive(parsed),
            Err(err) => rejected.push(format!("{directive}: {err}")),
        }
    }
    // Logs go to stderr so that scripted stdout stays machine-readable.
    let installed = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(err) = &installed {
        debug!(error = %err, "tracing subscriber already installed; keeping it");
    }
    for entry in rejected {
        warn!(directive = %entry, "ignoring invalid log directive");
    }
    installed.is_ok()
}
