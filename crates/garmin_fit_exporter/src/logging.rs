use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV: &str = "GARMIN_EXPORTER_LOG_LEVEL";
const QUIET_TARGETS: &str = "reqwest=warn,hyper=warn,hyper_util=warn";

/// Filter directive: `GARMIN_EXPORTER_LOG_LEVEL`, then `RUST_LOG`, then `info`,
/// with HTTP internals kept at `warn`.
pub fn filter_directive<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let level = get(LOG_LEVEL_ENV)
        .or_else(|| get("RUST_LOG"))
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    format!("{level},{QUIET_TARGETS}")
}

/// Install the stderr subscriber. Stdout is left to prompts and the summary.
pub fn init() {
    let directive = filter_directive(|k| std::env::var(k).ok());
    let env_filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_TARGETS}")));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("log filter: {}", directive);
}
