/// Host-side tracing setup. Call once before driving any use case; embedding
/// hosts that install their own subscriber can skip this.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "share_sync=debug".into()),
        )
        .init();
}
