//! Callback signature verification.
//!
//! Gateway callbacks are authenticated with an HMAC-SHA256 signature over
//! `timestamp.payload`, delivered in a header of the form
//! `t=<timestamp>,v1=<signature>`. Verification rejects stale timestamps to
//! prevent replay attacks and compares signatures in constant time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for callback events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Error parsing the callback signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing callback signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed callback signature header components.
///
/// The header format is: `t=timestamp,v1=signature`
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureHeader {
    /// Unix timestamp when the gateway signed the event.
    pub timestamp: i64,

    /// HMAC-SHA256 signature, hex-decoded.
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parse a signature header into components.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signature = Some(
                        hex_decode(value.trim())
                            .ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureParseError::MissingTimestamp)?,
            v1_signature: v1_signature.ok_or(SignatureParseError::MissingV1Signature)?,
        })
    }
}

/// Verifier for signed gateway callbacks.
///
/// Owns the shared signing secret; constructed once per gateway adapter.
#[derive(Clone)]
pub struct CallbackVerifier {
    secret: SecretString,
}

impl CallbackVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verify a callback payload against its signature header.
    ///
    /// # Security
    ///
    /// - Uses constant-time comparison to prevent timing attacks
    /// - Validates timestamp to prevent replay attacks
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), GatewayError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), GatewayError> {
        let header = SignatureHeader::parse(header)
            .map_err(|e| GatewayError::invalid_callback(e.to_string()))?;

        // 1. Validate timestamp (prevent replay attacks)
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Callback event too old - possible replay attack"
            );
            return Err(GatewayError::invalid_callback(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Callback event from future - clock skew or manipulation"
            );
            return Err(GatewayError::invalid_callback("Event timestamp in future"));
        }

        // 2. Compute expected signature
        let expected = self.compute_signature(payload, header.timestamp);

        // 3. Constant-time comparison
        let expected_bytes: &[u8] = expected.as_slice();
        let provided_bytes: &[u8] = &header.v1_signature;

        if expected_bytes.ct_eq(provided_bytes).unwrap_u8() != 1 {
            tracing::warn!("Invalid callback signature");
            return Err(GatewayError::invalid_callback("Invalid signature"));
        }

        Ok(())
    }

    /// Produce a signature header for a payload (used by tests and by
    /// outbound simulations).
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let signature = self.compute_signature(payload, timestamp);
        format!("t={},v1={}", timestamp, hex_encode(&signature))
    }

    fn compute_signature(&self, payload: &[u8], timestamp: i64) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
