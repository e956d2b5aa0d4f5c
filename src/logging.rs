use env_logger::Env;

/// `HANDPILOT_LOG` wins over `RUST_LOG`; both fall back to `info`.
pub fn init() {
    let env = Env::default()
        .filter_or("HANDPILOT_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .write_style("HANDPILOT_LOG_STYLE");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
