/// Structured logging setup
///
/// JSON output with an env-filter; `RUST_LOG` overrides the default level.
/// Call once at startup.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "auth_core=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();
}
