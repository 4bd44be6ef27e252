use env_logger::Env;

/// Logs go to stderr; stdout is reserved for tool output.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init();
}
