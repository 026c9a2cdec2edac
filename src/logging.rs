use env_logger::{Builder, Env, Target};

/// Environment variable holding the log filter, e.g. `debug` or `bokja_ai=info`.
pub const LOG_ENV: &str = "BOKJA_LOG";

/// Installs the stderr logger. stdout is reserved for the JSON result.
pub fn init() {
    let _ = Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"))
        .target(Target::Stderr)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
