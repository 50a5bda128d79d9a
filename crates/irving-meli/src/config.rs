use std::time::Duration;

/// Connection settings for the Mercado Libre API.
#[derive(Debug, Clone)]
pub struct MeliConfig {
    pub base_url: String,
    /// Application id issued in the developer console.
    pub app_id: String,
    pub secret_key: String,
    pub timeout: Duration,
}

impl MeliConfig {
    pub fn new(app_id: &str, secret_key: &str) -> Self {
        Self {
            base_url: "https://api.mercadolibre.com".to_string(),
            app_id: app_id.to_string(),
            secret_key: secret_key.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point the client somewhere else, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_to_production_api() {
        let config = MeliConfig::new("app", "secret");

        assert_eq!(config.base_url, "https://api.mercadolibre.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_base_url_override_drops_trailing_slash() {
        let config = MeliConfig::new("app", "secret").with_base_url("http://localhost:8080/");

        assert_eq!(config.base_url, "http://localhost:8080");
    }
}
