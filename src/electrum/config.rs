use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// `host:port` of the Electrum server's TCP interface
    pub endpoint: String,
    /// Bound on connect + write + read of one call
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Config {
    pub fn new(endpoint: &str) -> Config {
        Config {
            endpoint: endpoint.to_owned(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }

    pub fn set_timeout(mut self, timeout: Duration) -> Config {
        self.timeout = timeout;
        self
    }

    pub fn set_max_retries(mut self, max_retries: u32) -> Config {
        self.max_retries = max_retries;
        self
    }

    pub fn set_retry_backoff(mut self, backoff: Duration) -> Config {
        self.retry_backoff = backoff;
        self
    }
}
