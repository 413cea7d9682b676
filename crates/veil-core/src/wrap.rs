//! Wrap and unwrap: the Sealed <-> Wrapped step.
//!
//! The Wrapped layer is the only thing that reaches the wire. It is authored
//! by a disposable identity that exists for the duration of one [`wrap`]
//! call, so the outer envelope carries nothing that links it to the sender.

use tracing::debug;

use veil_crypto::cipher;
use veil_crypto::{recipient_tag, Envelope, Identity, Layer, PublicKey};

use crate::errors::{EncryptionError, UnwrapError};

/// Wrap a signed Sealed envelope to `receiver` under a fresh disposable identity.
pub fn wrap(
    sealed: &Envelope,
    receiver: &PublicKey,
    created_at: u64,
) -> Result<Envelope, EncryptionError> {
    if sealed.layer != Layer::Sealed {
        return Err(EncryptionError::UnexpectedLayer {
            expected: Layer::Sealed.name(),
            got: sealed.layer.name(),
        });
    }
    if !sealed.is_signed() {
        return Err(EncryptionError::Unsigned);
    }

    // Dropped (and zeroized) on every return path below.
    let disposable = loop {
        let candidate = Identity::generate();
        if candidate.public_key() != &sealed.author_pubkey {
            break candidate;
        }
    };

    let inner = sealed.to_json()?;
    let content = cipher::encrypt(&disposable, receiver, inner.as_bytes())?;

    let wrapped = Envelope::build(
        Layer::Wrapped,
        disposable.public_key().clone(),
        vec![recipient_tag(receiver)],
        content,
        created_at,
    )
    .sign(&disposable)?;

    debug!(wrapped_id = %wrapped.id_hex(), "wrapped message");
    Ok(wrapped)
}

/// Open a Wrapped envelope as `receiver`, returning the verified Sealed envelope.
pub fn unwrap(wrapped: &Envelope, receiver: &Identity) -> Result<Envelope, UnwrapError> {
    if !wrapped.verify() {
        return Err(UnwrapError::SignatureInvalid);
    }
    if wrapped.layer != Layer::Wrapped {
        return Err(UnwrapError::MalformedEnvelope(format!(
            "expected wrapped layer, got {}",
            wrapped.layer.name()
        )));
    }

    let inner = cipher::decrypt(receiver, &wrapped.author_pubkey, &wrapped.content)?;
    let sealed = Envelope::from_json(&inner)?;

    if sealed.layer != Layer::Sealed {
        return Err(UnwrapError::MalformedEnvelope(format!(
            "expected sealed layer, got {}",
            sealed.layer.name()
        )));
    }
    if !sealed.verify() {
        return Err(UnwrapError::SignatureInvalid);
    }
    Ok(sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seal::seal;

    const NOW: u64 = 1_700_000_000;

    fn sealed_message(sender: &Identity, receiver: &PublicKey) -> Envelope {
        let direct = Envelope::build(
            Layer::Direct,
            sender.public_key().clone(),
            vec![recipient_tag(receiver)],
            "hello",
            NOW,
        )
        .sign(sender)
        .unwrap();
        seal(&direct, sender, receiver, NOW).unwrap()
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let sealed = sealed_message(&sender, receiver.public_key());

        let wrapped = wrap(&sealed, receiver.public_key(), NOW - 10).unwrap();
        assert_eq!(wrapped.layer, Layer::Wrapped);
        assert_eq!(wrapped.created_at, NOW - 10);
        assert_ne!(&wrapped.author_pubkey, sender.public_key());
        assert_ne!(&wrapped.author_pubkey, receiver.public_key());
        assert!(wrapped.is_addressed_to(receiver.public_key()));
        assert!(wrapped.verify());

        let recovered = unwrap(&wrapped, &receiver).unwrap();
        assert_eq!(recovered, sealed);
    }

    #[test]
    fn test_each_wrap_uses_new_identity() {
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let sealed = sealed_message(&sender, receiver.public_key());

        let a = wrap(&sealed, receiver.public_key(), NOW).unwrap();
        let b = wrap(&sealed, receiver.public_key(), NOW).unwrap();
        assert_ne!(a.author_pubkey, b.author_pubkey);
        assert_ne!(a.content, b.content);
    }

    #[test]
    fn test_wrap_rejects_direct() {
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let direct = Envelope::build(Layer::Direct, sender.public_key().clone(), vec![], "x", NOW)
            .sign(&sender)
            .unwrap();

        assert!(matches!(
            wrap(&direct, receiver.public_key(), NOW),
            Err(EncryptionError::UnexpectedLayer { .. })
        ));
    }

    #[test]
    fn test_unwrap_rejects_forged_signature() {
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let mut wrapped = wrap(
            &sealed_message(&sender, receiver.public_key()),
            receiver.public_key(),
            NOW,
        )
        .unwrap();
        wrapped.created_at += 1;

        assert_eq!(unwrap(&wrapped, &receiver).unwrap_err(), UnwrapError::SignatureInvalid);
    }

    #[test]
    fn test_unwrap_wrong_key() {
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let eve = Identity::generate();
        let wrapped = wrap(
            &sealed_message(&sender, receiver.public_key()),
            receiver.public_key(),
            NOW,
        )
        .unwrap();

        assert_eq!(unwrap(&wrapped, &eve).unwrap_err(), UnwrapError::DecryptionFailure);
    }

    #[test]
    fn test_unwrap_rejects_layer_confusion() {
        // A correctly signed Sealed envelope presented as if it were the outer layer.
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let sealed = sealed_message(&sender, receiver.public_key());

        assert!(matches!(
            unwrap(&sealed, &receiver),
            Err(UnwrapError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_unwrap_rejects_wrapped_direct() {
        // Outer layer that skips the seal and carries a Direct envelope.
        let sender = Identity::generate();
        let receiver = Identity::generate();
        let disposable = Identity::generate();
        let direct = Envelope::build(Layer::Direct, sender.public_key().clone(), vec![], "x", NOW)
            .sign(&sender)
            .unwrap();
        let content = cipher::encrypt(
            &disposable,
            receiver.public_key(),
            direct.to_json().unwrap().as_bytes(),
        )
        .unwrap();
        let wrapped = Envelope::build(
            Layer::Wrapped,
            disposable.public_key().clone(),
            vec![recipient_tag(receiver.public_key())],
            content,
            NOW,
        )
        .sign(&disposable)
        .unwrap();

        assert!(matches!(
            unwrap(&wrapped, &receiver),
            Err(UnwrapError::MalformedEnvelope(_))
        ));
    }
}
