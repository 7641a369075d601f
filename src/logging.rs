//! Log output for `hotpage watch` and `hotpage serve`.
//!
//! Every pipeline stage logs one line per thing it does, tagged with the stage
//! name (`[watcher] accepted: page`, `[stream] watching`). Lines go to stderr
//! so stdout stays clean for `hotpage config`.
//!
//! Levels come from the `[logging]` table of the settings file:
//!
//! ```toml
//! [logging]
//! default = "info"
//!
//! [logging.modules]
//! hotpage = "debug"
//! mongodb = "warn"
//! ```
//!
//! A set `RUST_LOG` replaces that table entirely:
//!
//! ```bash
//! RUST_LOG=hotpage=debug hotpage watch
//! RUST_LOG=hotpage=trace,tower_http=debug hotpage serve
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Local time of day with milliseconds, e.g. `14:02:31.087`.
struct SaveClock;

impl FormatTime for SaveClock {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// `default` followed by one `module=level` directive per override.
fn filter_directives(config: &LoggingConfig) -> String {
    config
        .modules
        .iter()
        .fold(config.default.clone(), |mut directives, (module, level)| {
            directives.push(',');
            directives.push_str(module);
            directives.push('=');
            directives.push_str(level);
            directives
        })
}

fn level_filter(config: &LoggingConfig) -> EnvFilter {
    match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(filter_directives(config)),
    }
}

/// Install the stderr subscriber for this process.
///
/// Only the first call installs anything. `main` calls it once settings are
/// loaded; later calls are no-ops.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(SaveClock)
            .with_level(true)
            .with_writer(std::io::stderr)
            .with_filter(level_filter(config));

        tracing_subscriber::registry().with(stderr_layer).init();
    });
}

/// Info line as `[stage] event` or `[stage] event: detail`.
///
/// ```ignore
/// log_event!("sync", "persisted", "{key}");
/// log_event!("stream", "watching");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Same shape as [`log_event!`] at debug level, for per-notification chatter
/// such as suppressed duplicates and empty reads.
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
