//! Conversation cipher for envelope content.
//!
//! Keys come from x-only ECDH between one party's secret and the other's
//! public key, stretched with HKDF-SHA256 under a fresh random salt, and
//! used with ChaCha20Poly1305.
//!
//! Payload layout (then base64, standard alphabet with padding):
//!
//! ```text
//! version (1) || salt (32) || ciphertext+tag
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::identity::{Identity, PublicKey};

pub const VERSION: u8 = 1;
pub const SALT_LEN: usize = 32;
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptFailed,
    #[error("decryption failed")]
    DecryptFailed,
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),
    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u8),
}

fn kdf_key_nonce(
    shared_secret: &[u8; 32],
    salt: &[u8],
) -> Option<(Zeroizing<[u8; 32]>, [u8; 12])> {
    let hk = Hkdf::<Sha256>::new(Some(salt), shared_secret);

    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(b"veil_content_v1_key", &mut key[..]).ok()?;

    let mut nonce = [0u8; 12];
    hk.expand(b"veil_content_v1_nonce", &mut nonce).ok()?;

    Some((key, nonce))
}

/// Encrypt `plaintext` from `sender` to `recipient`.
pub fn encrypt(
    sender: &Identity,
    recipient: &PublicKey,
    plaintext: &[u8],
) -> Result<String, CipherError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt).map_err(|_| CipherError::EncryptFailed)?;
    encrypt_with_salt(sender, recipient, plaintext, &salt)
}

pub(crate) fn encrypt_with_salt(
    sender: &Identity,
    recipient: &PublicKey,
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
) -> Result<String, CipherError> {
    let shared = sender.shared_secret(recipient);
    let (key, nonce) = kdf_key_nonce(&shared, salt).ok_or(CipherError::EncryptFailed)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let ct = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &[VERSION],
            },
        )
        .map_err(|_| CipherError::EncryptFailed)?;

    let mut out = Vec::with_capacity(1 + SALT_LEN + ct.len());
    out.push(VERSION);
    out.extend_from_slice(salt);
    out.extend_from_slice(&ct);
    Ok(STANDARD.encode(out))
}

/// Decrypt a payload produced by [`encrypt`], as `recipient`, from `sender`.
pub fn decrypt(
    recipient: &Identity,
    sender: &PublicKey,
    payload: &str,
) -> Result<Vec<u8>, CipherError> {
    let blob = STANDARD
        .decode(payload)
        .map_err(|_| CipherError::InvalidPayload("not base64"))?;

    let (&version, rest) = blob
        .split_first()
        .ok_or(CipherError::InvalidPayload("empty"))?;
    if version != VERSION {
        return Err(CipherError::UnsupportedVersion(version));
    }
    if rest.len() < SALT_LEN + TAG_LEN {
        return Err(CipherError::InvalidPayload("truncated"));
    }
    let (salt, ct) = rest.split_at(SALT_LEN);

    let shared = recipient.shared_secret(sender);
    let (key, nonce) = kdf_key_nonce(&shared, salt).ok_or(CipherError::DecryptFailed)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    cipher
        .decrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: ct,
                aad: &[VERSION],
            },
        )
        .map_err(|_| CipherError::DecryptFailed)
}
