use std::time::Duration;

use secrecy::SecretString;

use crate::client::consts::{
    DEFAULT_CAPACITY, DEFAULT_URL, MEDIA_SERVER_TOKEN, MEDIA_SERVER_URL, VERB_TIMEOUT_MS,
};
use crate::verb::DEFAULT_VERB_TIMEOUT;

pub struct Config {
    url: String,
    token: SecretString,
    verb_timeout: Duration,
    capacity: usize,
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.config.url = url.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.config.token = SecretString::from(token.to_string());
        self
    }

    pub fn with_verb_timeout(mut self, timeout: Duration) -> Self {
        self.config.verb_timeout = timeout;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Defaults, overridden by `MEDIA_SERVER_URL`, `MEDIA_SERVER_TOKEN` and
    /// `VERB_TIMEOUT_MS` when they are set.
    pub fn new() -> Self {
        let verb_timeout = std::env::var(VERB_TIMEOUT_MS)
            .ok()
            .and_then(|ms| ms.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_VERB_TIMEOUT);
        Self {
            url: std::env::var(MEDIA_SERVER_URL).unwrap_or_else(|_| DEFAULT_URL.to_string()),
            token: std::env::var(MEDIA_SERVER_TOKEN)
                .unwrap_or_else(|_| "".to_string())
                .into(),
            verb_timeout,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn verb_timeout(&self) -> Duration {
        self.verb_timeout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .with_url("ws://media.local:9000/voice")
            .with_token("s3cret")
            .with_verb_timeout(Duration::from_secs(5))
            .with_capacity(0)
            .build();
        assert_eq!(config.url(), "ws://media.local:9000/voice");
        assert_eq!(config.token().expose_secret(), "s3cret");
        assert_eq!(config.verb_timeout(), Duration::from_secs(5));
        assert_eq!(config.capacity(), 1);
    }
}
