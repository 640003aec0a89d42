/// Server-level settings read once at startup. Grounded on the same
/// env-var-with-fallback pattern the credential layer uses for
/// `JWT_SECRET`; `JWT_SECRET` itself is read directly by `tl_auth::Crypto`
/// rather than duplicated here.
pub struct Config {
    pub bind_addr: String,
    pub workers: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8700".to_string()),
            workers: std::env::var("SERVER_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
        }
    }
}
