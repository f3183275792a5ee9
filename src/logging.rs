//! Logging initialization.
//!
//! One process-wide tracing subscriber writing to stdout and to
//! `pipeline.log` inside the output directory. Initialization is idempotent:
//! repeated calls never register a second subscriber or duplicate writers.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Once};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging. `verbose` lowers the default level to DEBUG;
/// `RUST_LOG` overrides either default. The log file lives at
/// `<output_dir>/pipeline.log`; if it cannot be opened, logging proceeds to
/// stdout only.
pub fn init(verbose: bool, output_dir: &Path) {
    INIT.call_once(|| {
        let default_level = if verbose { Level::DEBUG } else { Level::INFO };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

        let stdout_layer = fmt::layer().with_target(true);

        let file_layer = open_log_file(output_dir).map(|file| {
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true)
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    });
}

fn open_log_file(output_dir: &Path) -> Option<std::fs::File> {
    if let Err(e) = fs::create_dir_all(output_dir) {
        eprintln!(
            "warning: cannot create {} for pipeline.log: {e}",
            output_dir.display()
        );
        return None;
    }

    match OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_dir.join("pipeline.log"))
    {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("warning: cannot open pipeline.log: {e}");
            None
        }
    }
}
