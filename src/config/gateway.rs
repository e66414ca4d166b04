//! Payment gateway configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::gateway::GatewayConfig;

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Gateway secret API key
    pub api_key: String,

    /// Callback signing secret
    pub callback_secret: String,

    /// Base URL for the gateway API (optional, defaults to the live API)
    pub api_base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            callback_secret: String::new(),
            api_base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewaySettings {
    /// Check if using gateway test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    /// Build the adapter configuration from these settings.
    pub fn adapter_config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(self.api_key.clone(), self.callback_secret.clone())
            .with_timeout_secs(self.timeout_secs);
        match &self.api_base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        }
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_API_KEY"));
        }
        if self.callback_secret.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_CALLBACK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if !self.callback_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidCallbackSecret);
        }
        if let Some(url) = &self.api_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidGatewayUrl);
            }
        }
        if !(1..=120).contains(&self.timeout_secs) {
            return Err(ValidationError::InvalidGatewayTimeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewaySettings {
        GatewaySettings {
            api_key: "sk_test_abcd1234".to_string(),
            callback_secret: "whsec_xyz789".to_string(),
            ..GatewaySettings::default()
        }
    }

    #[test]
    fn test_is_test_mode() {
        assert!(valid().is_test_mode());

        let live = GatewaySettings {
            api_key: "sk_live_abcd1234".to_string(),
            ..valid()
        };
        assert!(!live.is_test_mode());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = GatewaySettings::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = GatewaySettings {
            api_key: "pk_test_xxx".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_callback_secret_prefix() {
        let config = GatewaySettings {
            callback_secret: "secret_xxx".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = GatewaySettings {
            timeout_secs: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_base_url() {
        let config = GatewaySettings {
            api_base_url: Some("ftp://payments.example.com".to_string()),
            ..valid()
        };
        assert!(config.validate().is_err());
    }
}
