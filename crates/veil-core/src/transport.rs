//! Broadcast transport seam.
//!
//! The pipeline never talks to the network itself. A [`Transport`] is
//! injected by the caller; it accepts fully formed Wrapped envelopes for
//! publishing and delivers Wrapped envelopes addressed to a recipient.
//!
//! [`MemoryRelay`] is an in-process implementation used by tests and the
//! CLI. Like a public relay, it keeps every envelope it accepted, which is
//! exactly the view an outside observer has.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use veil_crypto::{Envelope, Layer, PublicKey};

/// Default capacity of the relay fan-out channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Only Wrapped envelopes may be handed to a transport
    #[error("transport failed: refusing to publish a {0} envelope")]
    NotWrapped(&'static str),

    #[error("transport failed: relay closed")]
    Closed,

    #[error("transport failed: {0}")]
    Endpoint(String),
}

/// Per-endpoint publish outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAck {
    pub endpoint: String,
    pub accepted: bool,
    pub message: Option<String>,
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::Receiver<Envelope>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Build a subscription fed by `rx`. `pump` is aborted on unsubscribe.
    pub fn new(rx: mpsc::Receiver<Envelope>, pump: Option<JoinHandle<()>>) -> Self {
        Self { rx, pump }
    }

    /// Next delivered envelope, or `None` once the transport is gone.
    pub async fn next(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a Wrapped envelope to every endpoint.
    async fn publish(&self, envelope: &Envelope) -> Result<Vec<RelayAck>, TransportError>;

    /// Deliver Wrapped envelopes whose recipient tag names `recipient`.
    async fn subscribe(&self, recipient: &PublicKey) -> Result<Subscription, TransportError>;
}

/// In-process relay backed by a broadcast channel.
#[derive(Clone)]
pub struct MemoryRelay {
    endpoint: String,
    tx: broadcast::Sender<Arc<Envelope>>,
    log: Arc<RwLock<Vec<Envelope>>>,
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new("memory://relay", DEFAULT_CHANNEL_CAPACITY)
    }
}

impl MemoryRelay {
    pub fn new(endpoint: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            endpoint: endpoint.into(),
            tx,
            log: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every envelope accepted so far, in publish order.
    pub async fn published(&self) -> Vec<Envelope> {
        self.log.read().await.clone()
    }

    /// Push an arbitrary envelope to subscribers without any checks, as a
    /// hostile relay or peer might.
    pub fn inject(&self, envelope: Envelope) {
        let _ = self.tx.send(Arc::new(envelope));
    }
}

#[async_trait]
impl Transport for MemoryRelay {
    async fn publish(&self, envelope: &Envelope) -> Result<Vec<RelayAck>, TransportError> {
        if envelope.layer != Layer::Wrapped {
            return Err(TransportError::NotWrapped(envelope.layer.name()));
        }
        if !envelope.verify() {
            return Ok(vec![RelayAck {
                endpoint: self.endpoint.clone(),
                accepted: false,
                message: Some("invalid: bad signature".to_string()),
            }]);
        }

        self.log.write().await.push(envelope.clone());
        // No live subscribers is not an error; the envelope stays in the log.
        let receivers = self.tx.send(Arc::new(envelope.clone())).unwrap_or(0);
        debug!(id = %envelope.id_hex(), receivers, "relay accepted envelope");

        Ok(vec![RelayAck {
            endpoint: self.endpoint.clone(),
            accepted: true,
            message: None,
        }])
    }

    async fn subscribe(&self, recipient: &PublicKey) -> Result<Subscription, TransportError> {
        let mut rx = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let recipient = recipient.clone();

        let pump = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if !envelope.is_addressed_to(&recipient) {
                            continue;
                        }
                        if out_tx.send((*envelope).clone()).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber lagged, envelopes skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(out_rx, Some(pump)))
    }
}
