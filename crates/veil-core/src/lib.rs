//! Veil Core - the three-layer private messaging pipeline.
//!
//! This crate implements:
//! - Seal and unseal (Direct <-> Sealed, authored by the true sender)
//! - Wrap and unwrap (Sealed <-> Wrapped, authored by a disposable identity)
//! - Send and receive orchestration with a uniform receive failure
//! - Transport and key store abstractions with in-memory implementations
//! - The inbox delivery loop
//! - Structured payload encoding

#![forbid(unsafe_code)]

// Pipeline
pub mod seal;
pub mod wrap;
pub mod protocol;

// Collaborators
pub mod transport;
pub mod keystore;
pub mod inbox;

// Supporting modules
pub mod config;
pub mod errors;
pub mod payload;

pub use config::PipelineConfig;
pub use errors::{EncryptionError, NotRecoverable, SendError, UnwrapError};
pub use inbox::{Inbox, InboxStats};
pub use keystore::{InMemoryKeyStore, KeyStore, KeyStoreError};
pub use payload::{decode_payload, encode_payload, PayloadError};
pub use protocol::{receive, send, Messenger};
pub use seal::{seal, unseal, ReceivedMessage};
pub use transport::{MemoryRelay, RelayAck, Subscription, Transport, TransportError};
pub use wrap::{unwrap, wrap};

#[cfg(test)]
mod proptests;
