pub mod config;
pub mod coordinator;

/// Initializes env_logger at the configured level and spawns a ctrl-c
/// handler so the process exits promptly instead of waiting on in-flight
/// connections.
pub fn init(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("install ctrl-c handler");
        log::warn!("shutting down");
        std::process::exit(0);
    });
}
