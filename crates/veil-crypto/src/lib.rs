//! Veil cryptographic building blocks.
//!
//! - `identity`: secp256k1 key pairs with BIP-340 x-only public keys
//! - `event`: the canonical, signed envelope record
//! - `cipher`: ECDH-keyed ChaCha20Poly1305 encryption of envelope content

#![forbid(unsafe_code)]

pub mod hash;
pub mod identity;
pub mod event;
pub mod cipher;
pub mod utils;

#[cfg(test)]
mod proptests;

pub use cipher::CipherError;
pub use event::{recipient_tag, Envelope, EventError, Layer};
pub use identity::{Identity, InvalidKeyError, PublicKey};
