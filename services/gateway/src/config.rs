use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use risk_engine::ResolverConfig;
use security::SessionConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub risk: RiskConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RiskConfig {
    pub api_url: String,
    pub external_enabled: bool,
    pub timeout_seconds: u64,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionSettings {
    pub ttl_minutes: i64,
    pub sweep_interval_seconds: u64,
}

impl RiskConfig {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            external_enabled: self.external_enabled,
            timeout: Duration::from_secs(self.timeout_seconds),
            retry_count: self.retry_count,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl SessionSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl: chrono::Duration::minutes(self.ttl_minutes),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            .add_source(Environment::with_prefix("GATEWAY").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(url) = env::var("RISK_API_URL") {
            builder = builder.set_override("risk.api_url", url)?;
        }

        if let Ok(enabled) = env::var("RISK_API_ENABLED") {
            builder = builder.set_override("risk.external_enabled", enabled)?;
        }

        if let Ok(timeout) = env::var("RISK_API_TIMEOUT") {
            builder = builder.set_override("risk.timeout_seconds", timeout)?;
        }

        Self::from_builder(builder)
    }

    /// Builder holding only the built-in defaults
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", 4)?
            // External risk classifier
            .set_default("risk.api_url", "http://api.riscofraude.com/v1/consulta")?
            .set_default("risk.external_enabled", false)?
            .set_default("risk.timeout_seconds", 5)?
            .set_default("risk.retry_count", 2)?
            .set_default("risk.retry_delay_ms", 500)?
            // Sessions
            .set_default("session.ttl_minutes", 30)?
            .set_default("session.sweep_interval_seconds", 300)
    }

    /// Build and check a configuration from `builder`
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.session.ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "session.ttl_minutes must be positive".to_string(),
            ));
        }
        if self.session.sweep_interval_seconds == 0 {
            return Err(ConfigError::Message(
                "session.sweep_interval_seconds must be positive".to_string(),
            ));
        }
        self.risk
            .resolver_config()
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_builder(Config::defaults().unwrap()).unwrap();
        let resolver = config.risk.resolver_config();

        assert_eq!(resolver, ResolverConfig::default());
        assert_eq!(config.session.session_config(), SessionConfig::default());
        assert_eq!(config.session.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_overrides_are_applied() {
        let builder = Config::defaults()
            .unwrap()
            .set_override("risk.external_enabled", true)
            .unwrap()
            .set_override("risk.timeout_seconds", 2)
            .unwrap();
        let config = Config::from_builder(builder).unwrap();

        assert!(config.risk.external_enabled);
        assert_eq!(config.risk.resolver_config().timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_zero_timeout_is_rejected_when_enabled() {
        let builder = Config::defaults()
            .unwrap()
            .set_override("risk.external_enabled", true)
            .unwrap()
            .set_override("risk.timeout_seconds", 0)
            .unwrap();

        assert!(Config::from_builder(builder).is_err());
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        let builder = Config::defaults()
            .unwrap()
            .set_override("session.sweep_interval_seconds", 0)
            .unwrap();

        assert!(Config::from_builder(builder).is_err());
    }
}
