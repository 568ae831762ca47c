use crate::client::consts::{BASE_URL, VOICE_API_KEY, VOICE_GATEWAY_URL};
use secrecy::SecretString;

pub struct Config {
    base_url: String,
    api_key: SecretString,
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

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
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
    // Defaults come from the environment, falling back to the public gateway.
    pub fn new() -> Self {
        Self {
            base_url: std::env::var(VOICE_GATEWAY_URL)
                .unwrap_or_else(|_| BASE_URL.to_string()),
            api_key: std::env::var(VOICE_API_KEY)
                .unwrap_or_else(|_| "".to_string())
                .into(),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }
}
