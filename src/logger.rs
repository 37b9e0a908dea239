use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "TESTSYNC_LOG";
pub const LOG_FORMAT_ENV: &str = "TESTSYNC_LOG_FORMAT";

/// Install the process-wide subscriber. Logs go to stderr so that command
/// output on stdout stays pipeable. Calling this twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
