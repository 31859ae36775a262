use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the `EnvFilter` directives (e.g. `srt_folders=debug`).
pub const LOG_ENV_VAR: &str = "SRT_FOLDERS_LOG";

/// Initialize structured JSON logging on stderr.
///
/// Defaults to `warn` unless overridden by `SRT_FOLDERS_LOG`. Safe to call more than once; only
/// the first call installs a subscriber.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
