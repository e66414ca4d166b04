//! Registration lifecycle configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Registration and waitlist configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// How long a waitlist promotion offer stays live, in hours
    #[serde(default = "default_offer_window_hours")]
    pub offer_window_hours: i64,
}

fn default_offer_window_hours() -> i64 {
    24
}

impl RegistrationConfig {
    /// Validate registration configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=720).contains(&self.offer_window_hours) {
            return Err(ValidationError::InvalidOfferWindow);
        }
        Ok(())
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            offer_window_hours: default_offer_window_hours(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offer_window() {
        assert_eq!(RegistrationConfig::default().offer_window_hours, 24);
    }

    #[test]
    fn test_validation_rejects_out_of_range_window() {
        let config = RegistrationConfig {
            offer_window_hours: 0,
        };
        assert!(config.validate().is_err());

        let config = RegistrationConfig {
            offer_window_hours: 721,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_default() {
        assert!(RegistrationConfig::default().validate().is_ok());
    }
}
