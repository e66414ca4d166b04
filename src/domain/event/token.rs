//! Check-in tokens - single-use credentials proving a registration.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, Timestamp, UserId};

/// Number of random bytes in a token value (256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// A single-use check-in credential for one (event, user) pair.
///
/// At most one unused token exists per pair; issuing a new one replaces it.
/// Consumed tokens are kept for audit (`used_at`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInToken {
    /// Token owner.
    pub user_id: UserId,

    /// Unguessable token value (hex-encoded OS randomness).
    pub value: String,

    /// When the token was issued.
    pub issued_at: Timestamp,

    /// Whether the token has been consumed at the door.
    pub is_used: bool,

    /// When the token was consumed (if it has been).
    pub used_at: Option<Timestamp>,
}

impl CheckInToken {
    /// Creates a fresh unused token.
    pub fn new(user_id: UserId, value: String, issued_at: Timestamp) -> Self {
        Self {
            user_id,
            value,
            issued_at,
            is_used: false,
            used_at: None,
        }
    }

    /// Consumes the token.
    pub fn consume(&mut self, at: Timestamp) {
        self.is_used = true;
        self.used_at = Some(at);
    }
}

/// Generates a new token value from OS randomness.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Encode bytes to hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Encodable check-in payload, suitable for rendering as a scannable code.
///
/// Serialized as compact JSON; the door scanner sends the same string back
/// for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInPayload {
    /// Event the token admits to.
    pub event_id: EventId,

    /// Token owner.
    pub user_id: UserId,

    /// Token value to match against the latest issued token.
    pub token: String,

    /// When the token was issued.
    pub issued_at: Timestamp,
}

impl CheckInPayload {
    /// Encodes the payload as a compact JSON string.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("payload serialization should never fail")
    }

    /// Decodes a payload from its JSON string form.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn generated_values_are_unique_and_long_enough() {
        let v1 = generate_token_value();
        let v2 = generate_token_value();
        assert_ne!(v1, v2);
        // 32 bytes hex-encoded
        assert_eq!(v1.len(), 64);
        assert!(v1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn new_token_is_unused() {
        let token = CheckInToken::new(user("u1"), generate_token_value(), Timestamp::now());
        assert!(!token.is_used);
        assert!(token.used_at.is_none());
    }

    #[test]
    fn consume_sets_used_and_time() {
        let mut token = CheckInToken::new(user("u1"), generate_token_value(), Timestamp::now());
        let at = Timestamp::now();
        token.consume(at);
        assert!(token.is_used);
        assert_eq!(token.used_at, Some(at));
    }

    #[test]
    fn payload_roundtrips_through_encoding() {
        let payload = CheckInPayload {
            event_id: EventId::new(),
            user_id: user("u1"),
            token: generate_token_value(),
            issued_at: Timestamp::now(),
        };

        let encoded = payload.encode();
        let decoded = CheckInPayload::decode(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(CheckInPayload::decode("not json").is_err());
        assert!(CheckInPayload::decode("{\"event_id\": 12}").is_err());
    }
}
