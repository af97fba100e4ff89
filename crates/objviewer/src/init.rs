//! Logging setup.

/// Initializes the `env_logger` backend of the `log` facade.
///
/// The filter defaults to `info` and follows `RUST_LOG` when set. Calling
/// this more than once is harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}
