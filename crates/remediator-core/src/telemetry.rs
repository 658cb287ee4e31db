//! Log setup shared by `remediator` and `remediatord`.
//!
//! Log lines always go to stderr. The CLI prints plans, diagnoses and run
//! outcomes on stdout, and those must stay parseable when piped.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Environment variable selecting JSON log lines (`json`).
pub const LOG_FORMAT_ENV: &str = "REMEDIATOR_LOG_FORMAT";

/// Install the process-wide subscriber.
///
/// `RUST_LOG` overrides `level`. With `json` each event is one JSON object
/// per line. Only the first call in a process has any effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let base = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let output: Box<dyn Layer<Registry> + Send + Sync> = if json {
        base.json().boxed()
    } else {
        base.boxed()
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .ok();
}

/// Whether `REMEDIATOR_LOG_FORMAT` asks for JSON.
pub fn json_requested() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
