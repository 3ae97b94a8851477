//! Test log output

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Another harness may already own the global subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Install a fmt subscriber honoring `RUST_LOG`, once per process
///
/// Output goes through the test harness capture, so it only shows for
/// failing tests (or with `--nocapture`). Defaults to `warn`.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}
