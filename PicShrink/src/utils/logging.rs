//! Tracing subscriber setup
//!
//! Log output goes to stderr by default. Setting `PICSHRINK_LOG_PATH`
//! appends it to that file instead.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_PATH_ENV: &str = "PICSHRINK_LOG_PATH";
const DEFAULT_FILTER: &str = "info";

fn log_path() -> Option<PathBuf> {
    std::env::var_os(LOG_PATH_ENV).map(PathBuf::from)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global tracing subscriber
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing() {
    if let Some(path) = log_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                let _ = fmt()
                    .with_env_filter(env_filter())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
            }
        }
    }

    let _ = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
