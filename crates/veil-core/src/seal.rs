//! Seal and unseal: the Direct <-> Sealed step.
//!
//! The Sealed layer is authored and signed by the true sender. Its content
//! is the complete signed Direct envelope, encrypted under
//! ECDH(sender, receiver).

use tracing::debug;

use veil_crypto::cipher;
use veil_crypto::{recipient_tag, Envelope, Identity, Layer, PublicKey};

use crate::errors::{EncryptionError, UnwrapError};

/// Plaintext and provenance recovered by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub plaintext: String,
    /// True sender, taken from the Sealed layer.
    pub original_sender: PublicKey,
    /// `created_at` of the inner Direct envelope.
    pub sent_at: u64,
    /// Id of the inner Direct envelope, stable across re-wraps.
    pub message_id: [u8; 32],
}

/// Seal a signed Direct envelope from `sender` to `receiver`.
pub fn seal(
    direct: &Envelope,
    sender: &Identity,
    receiver: &PublicKey,
    created_at: u64,
) -> Result<Envelope, EncryptionError> {
    if direct.layer != Layer::Direct {
        return Err(EncryptionError::UnexpectedLayer {
            expected: Layer::Direct.name(),
            got: direct.layer.name(),
        });
    }
    if !direct.is_signed() {
        return Err(EncryptionError::Unsigned);
    }
    if &direct.author_pubkey != sender.public_key() {
        return Err(EncryptionError::AuthorMismatch);
    }

    let inner = direct.to_json()?;
    let content = cipher::encrypt(sender, receiver, inner.as_bytes())?;

    let sealed = Envelope::build(
        Layer::Sealed,
        sender.public_key().clone(),
        vec![recipient_tag(receiver)],
        content,
        created_at,
    )
    .sign(sender)?;

    debug!(sealed_id = %sealed.id_hex(), direct_id = %direct.id_hex(), "sealed message");
    Ok(sealed)
}

/// Open a Sealed envelope as `receiver`.
///
/// Checks, in order: the layer, the Sealed signature, decryption under
/// ECDH(receiver, sealed author), the inner Direct envelope's layer and
/// signature, and that the Direct author is the Sealed author.
pub fn unseal(sealed: &Envelope, receiver: &Identity) -> Result<ReceivedMessage, UnwrapError> {
    if sealed.layer != Layer::Sealed {
        return Err(UnwrapError::MalformedEnvelope(format!(
            "expected sealed layer, got {}",
            sealed.layer.name()
        )));
    }
    if !sealed.verify() {
        return Err(UnwrapError::SignatureInvalid);
    }

    let inner = cipher::decrypt(receiver, &sealed.author_pubkey, &sealed.content)?;
    let direct = Envelope::from_json(&inner)?;

    if direct.layer != Layer::Direct {
        return Err(UnwrapError::MalformedEnvelope(format!(
            "expected direct layer, got {}",
            direct.layer.name()
        )));
    }
    if !direct.verify() {
        return Err(UnwrapError::SignatureInvalid);
    }
    // The sealer vouches for the Direct envelope; it must be its own.
    if direct.author_pubkey != sealed.author_pubkey {
        return Err(UnwrapError::MalformedEnvelope(
            "direct author differs from sealer".to_string(),
        ));
    }

    Ok(ReceivedMessage {
        plaintext: direct.content,
        original_sender: sealed.author_pubkey.clone(),
        sent_at: direct.created_at,
        message_id: direct.id,
    })
}
