//! Provider configuration

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use idp_core::resource::Value;
use thiserror::Error;

// Read by the CLI as fallbacks for its connection flags

/// Environment variable holding the FusionAuth base URL
pub const ENV_HOST: &str = "FA_DOMAIN";
/// Environment variable holding the FusionAuth API key
pub const ENV_API_KEY: &str = "FA_API_KEY";
/// Environment variable holding the optional tenant id
pub const ENV_TENANT_ID: &str = "FA_TENANT_ID";

/// Errors raised while building the provider configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(String),

    #[error("invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// How strictly the `identityProvider` envelope of a read response is parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeParsing {
    /// A malformed envelope is logged and treated as an empty identity provider
    #[default]
    Lenient,
    /// A malformed envelope fails the read
    Strict,
}

impl FromStr for EnvelopeParsing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(EnvelopeParsing::Lenient),
            "strict" => Ok(EnvelopeParsing::Strict),
            other => Err(ConfigError::Invalid {
                key: "envelope_parsing".to_string(),
                message: format!("expected 'lenient' or 'strict', got '{}'", other),
            }),
        }
    }
}

/// Connection settings for a FusionAuth instance
#[derive(Clone)]
pub struct FusionAuthConfig {
    /// Base URL (e.g., "https://auth.example.com")
    pub host: String,
    pub api_key: String,
    /// Sent as `X-FusionAuth-TenantId` when set
    pub tenant_id: Option<String>,
    pub timeout: Option<Duration>,
    pub envelope_parsing: EnvelopeParsing,
}

impl std::fmt::Debug for FusionAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionAuthConfig")
            .field("host", &self.host)
            .field("api_key", &idp_core::schema::SENSITIVE_PLACEHOLDER)
            .field("tenant_id", &self.tenant_id)
            .field("timeout", &self.timeout)
            .field("envelope_parsing", &self.envelope_parsing)
            .finish()
    }
}

impl FusionAuthConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            tenant_id: None,
            timeout: None,
            envelope_parsing: EnvelopeParsing::default(),
        }
    }

    /// Build from a provider block
    ///
    /// Recognised keys: `host`, `api_key`, `tenant_id`, `timeout_seconds`, `envelope_parsing`.
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        let get_string = |key: &str| match attributes.get(key) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::Invalid {
                key: key.to_string(),
                message: "expected a string".to_string(),
            }),
            None => Ok(None),
        };

        let host = get_string("host")?.ok_or_else(|| ConfigError::Missing("host".to_string()))?;
        let api_key =
            get_string("api_key")?.ok_or_else(|| ConfigError::Missing("api_key".to_string()))?;

        let mut config = Self::new(host, api_key);
        config.tenant_id = get_string("tenant_id")?;

        match attributes.get("timeout_seconds") {
            Some(Value::Int(secs)) if *secs > 0 => {
                config.timeout = Some(Duration::from_secs(*secs as u64));
            }
            Some(_) => {
                return Err(ConfigError::Invalid {
                    key: "timeout_seconds".to_string(),
                    message: "expected a positive integer".to_string(),
                });
            }
            None => {}
        }

        if let Some(mode) = get_string("envelope_parsing")? {
            config.envelope_parsing = mode.parse()?;
        }

        Ok(config)
    }
}
