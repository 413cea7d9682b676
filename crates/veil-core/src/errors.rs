//! Error types for the Veil pipeline.
//!
//! Send-side errors are caller bugs and propagate with full detail.
//! Receive-side errors are kept internally as [`UnwrapError`] for local
//! logging, and collapse into the single [`NotRecoverable`] outcome before
//! they leave the crate.

use thiserror::Error;

use veil_crypto::{CipherError, EventError, InvalidKeyError};

// ============================================================================
// Send Side
// ============================================================================

/// Failures while sealing or wrapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    /// Receiver key rejected at seal/wrap time
    #[error("encryption failed: invalid receiver key: {0}")]
    InvalidReceiverKey(#[from] InvalidKeyError),

    /// Input envelope is at the wrong layer for this step
    #[error("encryption failed: expected {expected} envelope, got {got}")]
    UnexpectedLayer {
        expected: &'static str,
        got: &'static str,
    },

    /// Input envelope carries no valid signature
    #[error("encryption failed: input envelope is not signed")]
    Unsigned,

    /// Sealing identity is not the author of the Direct envelope
    #[error("encryption failed: sealer is not the message author")]
    AuthorMismatch,

    /// Cipher setup or AEAD failure
    #[error("encryption failed: {0}")]
    Cipher(#[from] CipherError),

    /// Envelope construction or signing failure
    #[error("encryption failed: {0}")]
    Event(#[from] EventError),
}

/// Error returned by `send`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] InvalidKeyError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

// ============================================================================
// Receive Side
// ============================================================================

/// Why a received layer could not be opened. Local diagnostics only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnwrapError {
    /// Wrong key or corrupted ciphertext. Intentionally not distinguished further.
    #[error("decryption failure")]
    DecryptionFailure,

    /// Decrypted bytes are not a well-formed envelope of the expected layer
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Recomputed id does not match, or signature invalid under the claimed author
    #[error("signature invalid")]
    SignatureInvalid,
}

impl From<CipherError> for UnwrapError {
    fn from(err: CipherError) -> Self {
        match err {
            // A payload that does not even decode is corrupted ciphertext.
            CipherError::DecryptFailed
            | CipherError::EncryptFailed
            | CipherError::InvalidPayload(_)
            | CipherError::UnsupportedVersion(_) => UnwrapError::DecryptionFailure,
        }
    }
}

impl From<EventError> for UnwrapError {
    fn from(err: EventError) -> Self {
        UnwrapError::MalformedEnvelope(err.to_string())
    }
}

/// The one externally visible receive failure.
///
/// Carries no cause so that nothing downstream can tell a forged envelope
/// from one encrypted to somebody else.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("message not recoverable")]
pub struct NotRecoverable;

impl From<UnwrapError> for NotRecoverable {
    fn from(_: UnwrapError) -> Self {
        NotRecoverable
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_errors_collapse() {
        let causes = [
            UnwrapError::DecryptionFailure,
            UnwrapError::MalformedEnvelope("bad json".into()),
            UnwrapError::SignatureInvalid,
        ];
        for cause in causes {
            let outward: NotRecoverable = cause.into();
            assert_eq!(outward, NotRecoverable);
            assert_eq!(outward.to_string(), "message not recoverable");
        }
    }

    #[test]
    fn test_cipher_errors_map_to_decryption_failure() {
        assert_eq!(
            UnwrapError::from(CipherError::InvalidPayload("not base64")),
            UnwrapError::DecryptionFailure
        );
        assert_eq!(
            UnwrapError::from(CipherError::UnsupportedVersion(2)),
            UnwrapError::DecryptionFailure
        );
    }

    #[test]
    fn test_send_error_wraps_key_error() {
        let err: SendError = InvalidKeyError::InvalidHex.into();
        assert!(matches!(err, SendError::InvalidKey(InvalidKeyError::InvalidHex)));
    }
}
