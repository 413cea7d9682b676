//! Canonical envelope record.
//!
//! Every layer of a message (Direct, Sealed, Wrapped) is the same record
//! type. Its id is SHA-256 over the canonical form
//!
//! ```text
//! [0,"<author hex>",<created_at>,<layer tag>,<tags>,"<content>"]
//! ```
//!
//! serialized as compact JSON, and the signature is BIP-340 Schnorr over
//! the 32 id bytes.

use k256::schnorr::Signature;
use serde::{Deserialize, Serialize};
use signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::hash::event_id;
use crate::identity::{Identity, PublicKey};
use crate::utils::constant_time_compare_array;

/// First element of a tag that references a recipient public key.
pub const RECIPIENT_TAG: &str = "p";

pub const ID_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("unknown layer tag {0}")]
    UnknownLayer(u16),
    #[error("signing identity does not match author_pubkey")]
    AuthorMismatch,
    #[error("signing failed")]
    SigningFailed,
    #[error("invalid {field} encoding")]
    InvalidEncoding { field: &'static str },
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// Layer discriminant, carried on the wire as its integer tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Layer {
    /// Plaintext message authored by the true sender.
    Direct,
    /// Direct envelope encrypted to the receiver, authored by the true sender.
    Sealed,
    /// Sealed envelope encrypted to the receiver under a disposable identity.
    Wrapped,
}

impl Layer {
    pub const fn tag(self) -> u16 {
        match self {
            Layer::Direct => 14,
            Layer::Sealed => 13,
            Layer::Wrapped => 1059,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Layer::Direct => "direct",
            Layer::Sealed => "sealed",
            Layer::Wrapped => "wrapped",
        }
    }
}

impl From<Layer> for u16 {
    fn from(layer: Layer) -> u16 {
        layer.tag()
    }
}

impl TryFrom<u16> for Layer {
    type Error = EventError;

    fn try_from(tag: u16) -> Result<Self, Self::Error> {
        match tag {
            14 => Ok(Layer::Direct),
            13 => Ok(Layer::Sealed),
            1059 => Ok(Layer::Wrapped),
            other => Err(EventError::UnknownLayer(other)),
        }
    }
}

/// Build the `["p", <hex>]` tag referencing `recipient`.
pub fn recipient_tag(recipient: &PublicKey) -> Vec<String> {
    vec![RECIPIENT_TAG.to_string(), recipient.to_hex()]
}

/// The envelope record moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct Envelope {
    pub id: [u8; ID_LEN],
    pub author_pubkey: PublicKey,
    pub created_at: u64,
    pub layer: Layer,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub signature: Option<[u8; SIGNATURE_LEN]>,
}

impl Envelope {
    /// Build an unsigned envelope with its id computed from the given fields.
    pub fn build(
        layer: Layer,
        author_pubkey: PublicKey,
        tags: Vec<Vec<String>>,
        content: impl Into<String>,
        created_at: u64,
    ) -> Self {
        let mut envelope = Self {
            id: [0u8; ID_LEN],
            author_pubkey,
            created_at,
            layer,
            tags,
            content: content.into(),
            signature: None,
        };
        envelope.id = envelope.compute_id();
        envelope
    }

    /// Canonical serialization the id is computed over.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::json!([
            0,
            self.author_pubkey.to_hex(),
            self.created_at,
            self.layer.tag(),
            self.tags,
            self.content,
        ])
        .to_string()
        .into_bytes()
    }

    /// Recompute the id from the current field values.
    pub fn compute_id(&self) -> [u8; ID_LEN] {
        event_id(&self.canonical_bytes())
    }

    /// Attach a signature over the id, recomputing the id first.
    pub fn sign(mut self, identity: &Identity) -> Result<Self, EventError> {
        if identity.public_key() != &self.author_pubkey {
            return Err(EventError::AuthorMismatch);
        }
        self.id = self.compute_id();
        let sig: Signature = identity
            .signing_key()
            .sign_prehash(&self.id)
            .map_err(|_| EventError::SigningFailed)?;
        self.signature = Some(sig.to_bytes());
        Ok(self)
    }

    /// Tamper check: the carried id matches the fields and the signature
    /// over it is valid under `author_pubkey`.
    pub fn verify(&self) -> bool {
        let Some(sig_bytes) = self.signature else {
            return false;
        };
        if !constant_time_compare_array(&self.compute_id(), &self.id) {
            return false;
        }
        let Some(verifying) = self.author_pubkey.verifying_key() else {
            return false;
        };
        let Ok(sig) = Signature::try_from(&sig_bytes[..]) else {
            return false;
        };
        verifying.verify_prehash(&self.id, &sig).is_ok()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// First recipient referenced by a `p` tag, if any parses.
    pub fn recipient(&self) -> Option<PublicKey> {
        self.tags
            .iter()
            .filter(|tag| tag.first().map(String::as_str) == Some(RECIPIENT_TAG))
            .find_map(|tag| tag.get(1).and_then(|hex| PublicKey::from_hex(hex).ok()))
    }

    pub fn is_addressed_to(&self, recipient: &PublicKey) -> bool {
        let hex = recipient.to_hex();
        self.tags.iter().any(|tag| {
            tag.first().map(String::as_str) == Some(RECIPIENT_TAG)
                && tag.get(1).map(String::as_str) == Some(hex.as_str())
        })
    }

    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }

    pub fn to_json(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(|e| EventError::Malformed(e.to_string()))
    }

    pub fn from_json(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(|e| EventError::Malformed(e.to_string()))
    }
}

/// JSON shape of an envelope on the wire.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    id: String,
    pubkey: PublicKey,
    created_at: u64,
    kind: Layer,
    tags: Vec<Vec<String>>,
    content: String,
    sig: String,
}

impl From<Envelope> for WireEnvelope {
    fn from(e: Envelope) -> Self {
        Self {
            id: hex::encode(e.id),
            pubkey: e.author_pubkey,
            created_at: e.created_at,
            kind: e.layer,
            tags: e.tags,
            content: e.content,
            sig: e.signature.map(hex::encode).unwrap_or_default(),
        }
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EventError;

    fn try_from(w: WireEnvelope) -> Result<Self, Self::Error> {
        let mut id = [0u8; ID_LEN];
        hex::decode_to_slice(&w.id, &mut id)
            .map_err(|_| EventError::InvalidEncoding { field: "id" })?;
        let mut sig = [0u8; SIGNATURE_LEN];
        hex::decode_to_slice(&w.sig, &mut sig)
            .map_err(|_| EventError::InvalidEncoding { field: "sig" })?;
        Ok(Self {
            id,
            author_pubkey: w.pubkey,
            created_at: w.created_at,
            layer: w.kind,
            tags: w.tags,
            content: w.content,
            signature: Some(sig),
        })
    }
}
