use std::{
    fs::{self, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level is `debug` when `debug`
/// is set and `info` otherwise. Output goes to `log_file` when given (appended,
/// parent directories created) and to stderr otherwise.
pub fn setup_logging(log_file: Option<&str>, debug: bool) -> io::Result<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));

    let result = match log_file {
        Some(log_file) => {
            if let Some(parent) = Path::new(log_file).parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(log_file)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };

    result.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
