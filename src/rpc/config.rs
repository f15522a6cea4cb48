use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub use_proxy: bool,
    /// Value of the `Authorization` header
    pub auth: Option<String>,
    pub timeout: Duration,
}
