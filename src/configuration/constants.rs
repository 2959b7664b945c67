pub mod cargo_env {
    pub const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
}

pub mod common {
    /// Prefix of every environment variable the tool reads.
    pub const ENV_PREFIX: &str = "TSQLR";
    pub const DEFAULT_PORT: i64 = 1433;
    pub const DEFAULT_TIMEOUT: &str = "10s";
    pub const DEFAULT_CONNECT_TIMEOUT: &str = "5s";
    pub const DEFAULT_REDRAW_INTERVAL: &str = "200ms";
}
