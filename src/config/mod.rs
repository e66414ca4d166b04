//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `GATHERLY_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gatherly::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod gateway;
mod registration;
mod telemetry;

pub use error::{ConfigError, ValidationError};
pub use gateway::GatewaySettings;
pub use registration::RegistrationConfig;
pub use telemetry::init_telemetry;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Payment gateway configuration
    pub gateway: GatewaySettings,

    /// Registration and waitlist configuration
    #[serde(default)]
    pub registration: RegistrationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GATHERLY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GATHERLY__GATEWAY__API_KEY=sk_test_...` -> `gateway.api_key = ...`
    /// - `GATHERLY__REGISTRATION__OFFER_WINDOW_HOURS=48` -> `registration.offer_window_hours = 48`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GATHERLY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.gateway.validate()?;
        self.registration.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("GATHERLY__GATEWAY__API_KEY", "sk_test_abcd1234");
        env::set_var("GATHERLY__GATEWAY__CALLBACK_SECRET", "whsec_xyz789");
    }

    fn clear_env() {
        env::remove_var("GATHERLY__GATEWAY__API_KEY");
        env::remove_var("GATHERLY__GATEWAY__CALLBACK_SECRET");
        env::remove_var("GATHERLY__REGISTRATION__OFFER_WINDOW_HOURS");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.gateway.api_key, "sk_test_abcd1234");
        assert_eq!(config.registration.offer_window_hours, 24);
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        assert!(result.unwrap().validate().is_ok());
    }

    #[test]
    fn test_custom_offer_window() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("GATHERLY__REGISTRATION__OFFER_WINDOW_HOURS", "48");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.registration.offer_window_hours, 48);
    }
}
