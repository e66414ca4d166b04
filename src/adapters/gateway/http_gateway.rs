//! HTTP payment gateway adapter.
//!
//! Implements the `PaymentGateway` trait against a Stripe-style payment
//! intents API. Handles intent creation, status lookup, refunds, and
//! callback verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = GatewayConfig::new(api_key, callback_secret);
//! let gateway = HttpPaymentGateway::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::ports::{
    CallbackEvent, CallbackKind, CreateIntentRequest, GatewayError, GatewayErrorCode,
    IntentStatus, PaymentGateway, PaymentIntent, RefundReceipt,
};

use super::callback::CallbackVerifier;

/// Default per-request timeout for gateway API calls.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Payment gateway API configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway secret API key.
    api_key: SecretString,

    /// Callback signing secret.
    callback_secret: SecretString,

    /// Base URL for the gateway API.
    api_base_url: String,

    /// Per-request timeout in seconds.
    timeout_secs: u64,
}

impl GatewayConfig {
    /// Create a new gateway configuration.
    pub fn new(api_key: impl Into<String>, callback_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            callback_secret: SecretString::new(callback_secret.into()),
            api_base_url: "https://api.payments.example.com".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `GATEWAY_API_KEY`
    /// - `GATEWAY_CALLBACK_SECRET`
    /// - `GATEWAY_API_BASE_URL` (optional)
    /// - `GATEWAY_TIMEOUT_SECS` (optional, defaults to 10)
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let api_key = std::env::var("GATEWAY_API_KEY")?;
        let callback_secret = std::env::var("GATEWAY_CALLBACK_SECRET")?;
        let api_base_url = std::env::var("GATEWAY_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.payments.example.com".to_string());
        let timeout_secs = std::env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_key: SecretString::new(api_key),
            callback_secret: SecretString::new(callback_secret),
            api_base_url,
            timeout_secs,
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set a custom per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP payment gateway adapter.
pub struct HttpPaymentGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
    verifier: CallbackVerifier,
}

impl HttpPaymentGateway {
    /// Create a new gateway adapter with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let verifier = CallbackVerifier::new(config.callback_secret.clone());
        Self {
            config,
            http_client: reqwest::Client::new(),
            verifier,
        }
    }

    async fn read_intent(&self, response: reqwest::Response) -> Result<PaymentIntent, GatewayError> {
        let wire: WireIntent = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorCode::ProviderError,
                format!("Failed to parse gateway response: {}", e),
            )
        })?;
        Ok(wire.into())
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let params = vec![
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("metadata[event_id]", request.event_id.to_string()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let mut builder = self
            .http_client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params);

        if let Some(idempotency_key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", idempotency_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::authentication("Gateway rejected API key"));
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Gateway create_intent failed");
            return Err(GatewayError::new(
                GatewayErrorCode::ProviderError,
                format!("Gateway API error: {}", error_text),
            ));
        }

        self.read_intent(response).await
    }

    async fn fetch_intent(&self, reference: &str) -> Result<PaymentIntent, GatewayError> {
        let url = format!(
            "{}/v1/payment_intents/{}",
            self.config.api_base_url, reference
        );

        let response = self
            .http_client
            .get(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found("Payment intent"));
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::new(
                GatewayErrorCode::ProviderError,
                format!("Gateway API error: {}", error_text),
            ));
        }

        self.read_intent(response).await
    }

    async fn refund(&self, reference: &str) -> Result<RefundReceipt, GatewayError> {
        let url = format!("{}/v1/refunds", self.config.api_base_url);

        let params = vec![("payment_intent", reference.to_string())];

        let response = self
            .http_client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found("Payment intent"));
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, reference = %reference, "Gateway refund failed");
            return Err(GatewayError::new(
                GatewayErrorCode::ProviderError,
                format!("Gateway API error: {}", error_text),
            ));
        }

        let wire: WireRefund = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorCode::ProviderError,
                format!("Failed to parse gateway response: {}", e),
            )
        })?;

        Ok(RefundReceipt {
            reference: wire.payment_intent,
            refund_id: wire.id,
            amount_minor: wire.amount,
        })
    }

    async fn verify_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CallbackEvent, GatewayError> {
        self.verifier.verify(payload, signature)?;

        let wire: WireCallback = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse callback payload");
            GatewayError::invalid_callback(format!("Invalid JSON: {}", e))
        })?;

        let kind = match wire.event_type.as_str() {
            "payment_intent.succeeded" => CallbackKind::PaymentSucceeded,
            "payment_intent.payment_failed" => CallbackKind::PaymentFailed,
            "payment_intent.canceled" => CallbackKind::PaymentFailed,
            "refund.succeeded" => CallbackKind::RefundCompleted,
            other => CallbackKind::Unknown(other.to_string()),
        };

        let reference = wire
            .data
            .object
            .get("id")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| GatewayError::invalid_callback("Callback object has no id"))?
            .to_string();

        Ok(CallbackEvent {
            id: wire.id,
            kind,
            reference,
            created_at: wire.created,
        })
    }
}

/// Payment intent as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct WireIntent {
    id: String,
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
}

impl From<WireIntent> for PaymentIntent {
    fn from(wire: WireIntent) -> Self {
        let status = match wire.status.as_str() {
            "requires_payment_method" | "requires_confirmation" | "requires_action" => {
                IntentStatus::RequiresPayment
            }
            "processing" => IntentStatus::Processing,
            "succeeded" => IntentStatus::Succeeded,
            "failed" => IntentStatus::Failed,
            "canceled" => IntentStatus::Canceled,
            other => IntentStatus::Unknown(other.to_string()),
        };

        PaymentIntent {
            reference: wire.id,
            client_secret: wire.client_secret.unwrap_or_default(),
            status,
            amount_minor: wire.amount,
            currency: wire.currency,
        }
    }
}

/// Refund object as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct WireRefund {
    id: String,
    payment_intent: String,
    amount: i64,
}

/// Raw callback event envelope as received from the gateway.
#[derive(Debug, Deserialize)]
struct WireCallback {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: WireCallbackData,
}

#[derive(Debug, Deserialize)]
struct WireCallbackData {
    object: JsonValue,
}
