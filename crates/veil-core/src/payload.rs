//! Structured application payloads.
//!
//! The pipeline treats message content as an opaque string. Higher layers
//! that exchange structured data serialize it to JSON and pass the result as
//! the Direct envelope content.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("payload decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize `value` into a message body.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<String, PayloadError> {
    serde_json::to_string(value).map_err(PayloadError::Encode)
}

/// Parse a message body produced by [`encode_payload`].
pub fn decode_payload<T: DeserializeOwned>(content: &str) -> Result<T, PayloadError> {
    serde_json::from_str(content).map_err(PayloadError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct DisputeNote {
        order_id: String,
        amount_sats: u64,
        evidence: Vec<String>,
    }

    #[test]
    fn test_structured_payload() {
        let note = DisputeNote {
            order_id: "ord-42".into(),
            amount_sats: 21_000,
            evidence: vec!["receipt".into(), "chat log".into()],
        };
        let body = encode_payload(&note).unwrap();
        assert_eq!(decode_payload::<DisputeNote>(&body).unwrap(), note);
    }

    #[test]
    fn test_decode_rejects_plain_text() {
        assert!(matches!(
            decode_payload::<DisputeNote>("hello"),
            Err(PayloadError::Decode(_))
        ));
    }
}
