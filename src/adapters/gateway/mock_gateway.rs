//! Mock payment gateway for testing.
//!
//! Deterministic in-process stand-in for the HTTP gateway. Records every
//! call for assertions and lets tests script intent statuses and failures.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::ports::{
    CallbackEvent, CallbackKind, CreateIntentRequest, GatewayError, GatewayErrorCode,
    IntentStatus, PaymentGateway, PaymentIntent, RefundReceipt,
};

/// Mock payment gateway for testing.
///
/// Intents get sequential `pi_mock_N` references. Callback payloads are
/// accepted when signed with [`MockPaymentGateway::VALID_SIGNATURE`];
/// anything else is rejected the way a real signature check would.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct MockPaymentGateway {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    sequence: u64,
    intents: HashMap<String, PaymentIntent>,
    statuses: HashMap<String, IntentStatus>,
    by_idempotency_key: HashMap<String, String>,
    refunds: Vec<String>,
    fail_next_create: Option<String>,
    fail_next_refund: Option<String>,
}

impl MockPaymentGateway {
    /// Signature accepted by `verify_callback`.
    pub const VALID_SIGNATURE: &'static str = "t=0,v1=mock_valid";

    /// Creates a new mock gateway.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Builds a callback payload for the given kind and reference.
    pub fn callback_payload(kind: CallbackKind, reference: &str) -> Vec<u8> {
        let event = CallbackEvent {
            id: format!("evt_mock_{}", reference),
            kind,
            reference: reference.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };
        serde_json::to_vec(&event).expect("callback event serializes")
    }

    /// Number of intents created so far (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn created_intents(&self) -> usize {
        self.lock().intents.len()
    }

    /// References refunded so far, in call order (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn refunds(&self) -> Vec<String> {
        self.lock().refunds.clone()
    }

    /// Scripts the status `fetch_intent` reports for a reference.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_intent_status(&self, reference: &str, status: IntentStatus) {
        self.lock().statuses.insert(reference.to_string(), status);
    }

    /// Makes the next `create_intent` call fail with the given message.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_next_create(&self, message: &str) {
        self.lock().fail_next_create = Some(message.to_string());
    }

    /// Makes the next `refund` call fail with the given message.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_next_refund(&self, message: &str) {
        self.lock().fail_next_refund = Some(message.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .expect("MockPaymentGateway: state lock poisoned")
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.lock();

        if let Some(message) = state.fail_next_create.take() {
            return Err(GatewayError::new(GatewayErrorCode::ProviderError, message));
        }

        if let Some(key) = &request.idempotency_key {
            if let Some(reference) = state.by_idempotency_key.get(key) {
                let existing = state.intents[reference].clone();
                return Ok(existing);
            }
        }

        state.sequence += 1;
        let reference = format!("pi_mock_{}", state.sequence);
        let intent = PaymentIntent {
            reference: reference.clone(),
            client_secret: format!("{}_secret", reference),
            status: IntentStatus::RequiresPayment,
            amount_minor: request.amount_minor,
            currency: request.currency.clone(),
        };

        state.intents.insert(reference.clone(), intent.clone());
        if let Some(key) = request.idempotency_key {
            state.by_idempotency_key.insert(key, reference);
        }

        Ok(intent)
    }

    async fn fetch_intent(&self, reference: &str) -> Result<PaymentIntent, GatewayError> {
        let state = self.lock();

        let status = state.statuses.get(reference).cloned();
        match (state.intents.get(reference), status) {
            (Some(intent), status) => {
                let mut intent = intent.clone();
                if let Some(status) = status {
                    intent.status = status;
                }
                Ok(intent)
            }
            // Scripted reference never created through this mock.
            (None, Some(status)) => Ok(PaymentIntent {
                reference: reference.to_string(),
                client_secret: format!("{}_secret", reference),
                status,
                amount_minor: 0,
                currency: "usd".to_string(),
            }),
            (None, None) => Err(GatewayError::not_found("Payment intent")),
        }
    }

    async fn refund(&self, reference: &str) -> Result<RefundReceipt, GatewayError> {
        let mut state = self.lock();

        if let Some(message) = state.fail_next_refund.take() {
            return Err(GatewayError::network(message));
        }

        let amount_minor = state
            .intents
            .get(reference)
            .map(|i| i.amount_minor)
            .unwrap_or(0);
        state.refunds.push(reference.to_string());
        state
            .statuses
            .insert(reference.to_string(), IntentStatus::Canceled);

        Ok(RefundReceipt {
            reference: reference.to_string(),
            refund_id: format!("re_mock_{}", state.refunds.len()),
            amount_minor,
        })
    }

    async fn verify_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CallbackEvent, GatewayError> {
        if signature != Self::VALID_SIGNATURE {
            return Err(GatewayError::invalid_callback("Invalid signature"));
        }

        serde_json::from_slice(payload)
            .map_err(|e| GatewayError::invalid_callback(format!("Invalid JSON: {}", e)))
    }
}
