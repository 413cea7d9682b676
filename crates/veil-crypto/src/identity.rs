//! Identity module for secp256k1 keypair management.
//!
//! One key serves both roles in the pipeline: BIP-340 Schnorr signing of
//! envelope ids and x-only ECDH for content encryption. Secret material is
//! zeroized when the Identity is dropped.

use std::fmt;
use std::hash::{Hash, Hasher};

use k256::schnorr::{SigningKey, VerifyingKey};
use k256::{ecdh, SecretKey};
use rand_core::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// SEC1 prefix selecting the even-y point for an x coordinate.
const EVEN_Y_TAG: u8 = 0x02;

/// Length of a secret scalar and of an x-only public key.
pub const KEY_LEN: usize = 32;

/// Malformed or out-of-range key material supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidKeyError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("secret scalar is zero or not below the curve order")]
    ScalarOutOfRange,
    #[error("x coordinate is not on the curve")]
    InvalidPublicKey,
}

/// A secp256k1 identity.
///
/// Holds the private scalar as imported (so it can be exported unchanged)
/// and the BIP-340 signing key derived from it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Identity {
    #[zeroize(skip)] // SecretKey zeroizes itself on drop
    secret: SecretKey,
    #[zeroize(skip)] // SigningKey zeroizes itself on drop
    signing: SigningKey,
    #[zeroize(skip)]
    public: PublicKey,
}

impl Identity {
    /// Generate a new random identity from the OS CSPRNG.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        Self::from_secret(secret)
    }

    /// Import an identity from a 32-byte big-endian secret scalar.
    pub fn import(bytes: &[u8]) -> Result<Self, InvalidKeyError> {
        if bytes.len() != KEY_LEN {
            return Err(InvalidKeyError::InvalidKeyLength {
                expected: KEY_LEN,
                got: bytes.len(),
            });
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| InvalidKeyError::ScalarOutOfRange)?;
        Ok(Self::from_secret(secret))
    }

    /// Import an identity from a 64-character hex secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self, InvalidKeyError> {
        let bytes = Zeroizing::new(
            hex::decode(secret_hex.trim()).map_err(|_| InvalidKeyError::InvalidHex)?,
        );
        Self::import(&bytes)
    }

    fn from_secret(secret: SecretKey) -> Self {
        let signing = SigningKey::from(secret.to_nonzero_scalar());
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(signing.verifying_key().to_bytes().as_slice());
        let public = PublicKey {
            bytes,
            point: secret.public_key(),
        };
        Self {
            secret,
            signing,
            public,
        }
    }

    /// The x-only public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Export the secret scalar as hex. The caller owns the returned secret.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        let mut bytes: [u8; KEY_LEN] = self.secret.to_bytes().into();
        let out = Zeroizing::new(hex::encode(bytes));
        bytes.zeroize();
        out
    }

    /// x-only ECDH: the x coordinate of `secret * peer`.
    ///
    /// Both parties arrive at the same value regardless of the parity
    /// normalization BIP-340 applies to either key.
    pub fn shared_secret(&self, peer: &PublicKey) -> Zeroizing<[u8; 32]> {
        let shared = ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer.point.as_affine());
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(shared.raw_secret_bytes().as_slice());
        out
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// A BIP-340 x-only public key, hex encoded on the wire.
#[derive(Clone)]
pub struct PublicKey {
    bytes: [u8; KEY_LEN],
    // Curve point with x = `bytes`, used for ECDH. Either y parity yields
    // the same x-only shared secret.
    point: k256::PublicKey,
}

impl PublicKey {
    /// Parse an x-only key, validating that the x coordinate is on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidKeyError> {
        if bytes.len() != KEY_LEN {
            return Err(InvalidKeyError::InvalidKeyLength {
                expected: KEY_LEN,
                got: bytes.len(),
            });
        }
        let mut sec1 = [0u8; KEY_LEN + 1];
        sec1[0] = EVEN_Y_TAG;
        sec1[1..].copy_from_slice(bytes);
        let point = k256::PublicKey::from_sec1_bytes(&sec1)
            .map_err(|_| InvalidKeyError::InvalidPublicKey)?;
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key, point })
    }

    pub fn from_hex(s: &str) -> Result<Self, InvalidKeyError> {
        let bytes = hex::decode(s).map_err(|_| InvalidKeyError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// BIP-340 verifying key for this x coordinate.
    pub(crate) fn verifying_key(&self) -> Option<VerifyingKey> {
        VerifyingKey::from_bytes(&self.bytes).ok()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
