//! Tracing subscriber setup. Logs go to stderr so `list` and `gen-config` output on
//! stdout stays machine-readable.
use crate::cli::LogFormat;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Full => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
