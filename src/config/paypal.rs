//! PayPal configuration

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// PayPal account and webhook verification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalConfig {
    /// Webhook id registered with PayPal; part of every signed message
    #[serde(default)]
    pub webhook_id: String,

    #[serde(default)]
    pub environment: PaypalEnvironment,

    /// REST client id (used by billing collaborators, not verification)
    pub client_id: Option<String>,

    /// REST client secret
    pub client_secret: Option<SecretString>,

    /// Directory for downloaded signing certificates
    #[serde(default = "default_cert_cache_dir")]
    pub cert_cache_dir: String,

    /// Seconds a cached certificate is trusted; 0 keeps it forever
    #[serde(default = "default_cert_cache_ttl")]
    pub cert_cache_ttl_secs: u64,

    #[serde(default = "default_cert_fetch_timeout")]
    pub cert_fetch_timeout_secs: u64,

    /// Hosts allowed to serve signing certificates (comma-separated)
    #[serde(default = "default_allowed_cert_hosts")]
    pub allowed_cert_hosts: String,

    /// Seconds processed event ids are remembered for deduplication
    #[serde(default = "default_processed_event_retention")]
    pub processed_event_retention_secs: u64,
}

/// PayPal environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaypalEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl PaypalConfig {
    /// Base URL of the PayPal REST API for the configured environment
    pub fn api_base_url(&self) -> &'static str {
        match self.environment {
            PaypalEnvironment::Production => "https://api-m.paypal.com",
            PaypalEnvironment::Sandbox => "https://api-m.sandbox.paypal.com",
        }
    }

    /// `Authorization` header value for client-credential calls, if configured
    pub fn basic_auth_header(&self) -> Option<SecretString> {
        let client_id = self.client_id.as_deref().filter(|id| !id.is_empty())?;
        let client_secret = self.client_secret.as_ref()?;

        let credentials = format!("{}:{}", client_id, client_secret.expose_secret());
        Some(SecretString::new(format!(
            "Basic {}",
            STANDARD.encode(credentials)
        )))
    }

    pub fn is_production(&self) -> bool {
        self.environment == PaypalEnvironment::Production
    }

    /// `None` when cached certificates never expire
    pub fn cert_cache_ttl(&self) -> Option<Duration> {
        match self.cert_cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn cert_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.cert_fetch_timeout_secs)
    }

    pub fn processed_event_retention(&self) -> Duration {
        Duration::from_secs(self.processed_event_retention_secs)
    }

    /// Get allowed certificate hosts as a vector
    pub fn allowed_cert_hosts_list(&self) -> Vec<String> {
        self.allowed_cert_hosts
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate PayPal configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_WEBHOOK_ID"));
        }

        if self.is_production() {
            if self.client_id.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_ID"));
            }
            if self
                .client_secret
                .as_ref()
                .map_or(true, |s| s.expose_secret().is_empty())
            {
                return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_SECRET"));
            }
        }

        if self.cert_fetch_timeout_secs == 0 || self.cert_fetch_timeout_secs > 30 {
            return Err(ValidationError::InvalidCertFetchTimeout);
        }

        if self.allowed_cert_hosts_list().is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_ALLOWED_CERT_HOSTS"));
        }

        Ok(())
    }
}

impl Default for PaypalConfig {
    fn default() -> Self {
        Self {
            webhook_id: String::new(),
            environment: PaypalEnvironment::default(),
            client_id: None,
            client_secret: None,
            cert_cache_dir: default_cert_cache_dir(),
            cert_cache_ttl_secs: default_cert_cache_ttl(),
            cert_fetch_timeout_secs: default_cert_fetch_timeout(),
            allowed_cert_hosts: default_allowed_cert_hosts(),
            processed_event_retention_secs: default_processed_event_retention(),
        }
    }
}

fn default_cert_cache_dir() -> String {
    "temp/paypal-certs".to_string()
}

fn default_cert_cache_ttl() -> u64 {
    86_400
}

fn default_cert_fetch_timeout() -> u64 {
    5
}

fn default_allowed_cert_hosts() -> String {
    "paypal.com".to_string()
}

fn default_processed_event_retention() -> u64 {
    259_200
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaypalConfig {
        PaypalConfig {
            webhook_id: "WH-ID-123".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_api_base_url_per_environment() {
        let mut config = valid_config();
        assert_eq!(config.api_base_url(), "https://api-m.sandbox.paypal.com");

        config.environment = PaypalEnvironment::Production;
        assert_eq!(config.api_base_url(), "https://api-m.paypal.com");
    }

    #[test]
    fn test_basic_auth_header() {
        let config = PaypalConfig {
            client_id: Some("client".to_string()),
            client_secret: Some(SecretString::new("secret".to_string())),
            ..valid_config()
        };

        let header = config.basic_auth_header().unwrap();

        // base64("client:secret")
        assert_eq!(header.expose_secret(), "Basic Y2xpZW50OnNlY3JldA==");
    }

    #[test]
    fn test_basic_auth_header_requires_both_credentials() {
        let config = PaypalConfig {
            client_id: Some("client".to_string()),
            ..valid_config()
        };
        assert!(config.basic_auth_header().is_none());
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = PaypalConfig {
            client_secret: Some(SecretString::new("hunter2".to_string())),
            ..valid_config()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_cert_cache_ttl_zero_disables_expiry() {
        let mut config = valid_config();
        assert_eq!(config.cert_cache_ttl(), Some(Duration::from_secs(86_400)));

        config.cert_cache_ttl_secs = 0;
        assert_eq!(config.cert_cache_ttl(), None);
    }

    #[test]
    fn test_allowed_cert_hosts_parsing() {
        let config = PaypalConfig {
            allowed_cert_hosts: "paypal.com, paypalobjects.com,".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.allowed_cert_hosts_list(),
            vec!["paypal.com".to_string(), "paypalobjects.com".to_string()]
        );
    }

    #[test]
    fn test_validation_missing_webhook_id() {
        let config = PaypalConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYPAL_WEBHOOK_ID"))
        );
    }

    #[test]
    fn test_validation_production_requires_credentials() {
        let config = PaypalConfig {
            environment: PaypalEnvironment::Production,
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYPAL_CLIENT_ID"))
        );

        let config = PaypalConfig {
            environment: PaypalEnvironment::Production,
            client_id: Some("client".to_string()),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYPAL_CLIENT_SECRET"))
        );
    }

    #[test]
    fn test_validation_invalid_fetch_timeout() {
        let config = PaypalConfig {
            cert_fetch_timeout_secs: 0,
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCertFetchTimeout));

        let config = PaypalConfig {
            cert_fetch_timeout_secs: 31,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_host_list() {
        let config = PaypalConfig {
            allowed_cert_hosts: " , ".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYPAL_ALLOWED_CERT_HOSTS"))
        );
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }
}
