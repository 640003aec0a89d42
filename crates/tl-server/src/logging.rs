/// Initializes the `log` facade with `env_logger`, defaulting to `info`
/// when `RUST_LOG` isn't set so a bare run still produces useful output.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Registers an immediate (non-graceful) Ctrl+C handler: rooms mid-round
/// are not drained or persisted on shutdown, so there is nothing to wait
/// on before exiting.
pub fn register_interrupt() {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        log::warn!("interrupt received, exiting");
        std::process::exit(0);
    });
}
