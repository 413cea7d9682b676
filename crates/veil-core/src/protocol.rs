//! Send and receive.
//!
//! `send` = wrap(seal(build(Direct, ...))) and `receive` = unseal(unwrap(...)).
//! Both are stateless; a [`Messenger`] only carries the pipeline
//! configuration.

use rand_core::{OsRng, RngCore};
use tracing::debug;

use veil_crypto::{recipient_tag, Envelope, Identity, Layer, PublicKey};

use crate::config::PipelineConfig;
use crate::errors::{EncryptionError, NotRecoverable, SendError, UnwrapError};
use crate::seal::{seal, unseal, ReceivedMessage};
use crate::wrap::{unwrap, wrap};

/// Current unix time in seconds.
pub fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct Messenger {
    config: PipelineConfig,
}

impl Messenger {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build, seal and wrap `message` from `sender` to `receiver`.
    pub fn send(
        &self,
        sender: &Identity,
        receiver: &PublicKey,
        message: &str,
    ) -> Result<Envelope, SendError> {
        self.send_at(sender, receiver, message, now_unix())
    }

    /// [`Messenger::send`] with an explicit clock.
    pub fn send_at(
        &self,
        sender: &Identity,
        receiver: &PublicKey,
        message: &str,
        now: u64,
    ) -> Result<Envelope, SendError> {
        let direct = Envelope::build(
            Layer::Direct,
            sender.public_key().clone(),
            vec![recipient_tag(receiver)],
            message,
            now,
        )
        .sign(sender)
        .map_err(EncryptionError::from)?;

        let sealed = seal(&direct, sender, receiver, now)?;
        let wrapped = wrap(&sealed, receiver, self.wrap_timestamp(now))?;
        Ok(wrapped)
    }

    /// Like [`Messenger::send`], with the receiver given as hex.
    pub fn send_to_hex(
        &self,
        sender: &Identity,
        receiver_hex: &str,
        message: &str,
    ) -> Result<Envelope, SendError> {
        let receiver = PublicKey::from_hex(receiver_hex)?;
        self.send(sender, &receiver, message)
    }

    /// Unwrap and unseal. Every failure is reported as [`NotRecoverable`];
    /// the specific cause is only logged locally.
    pub fn receive(
        &self,
        receiver: &Identity,
        wrapped: &Envelope,
    ) -> Result<ReceivedMessage, NotRecoverable> {
        open(receiver, wrapped).map_err(|cause| {
            debug!(envelope_id = %wrapped.id_hex(), %cause, "dropping unrecoverable envelope");
            NotRecoverable
        })
    }

    /// Outer timestamp, pushed back by up to `jitter_secs`.
    fn wrap_timestamp(&self, now: u64) -> u64 {
        match self.config.jitter_secs {
            0 => now,
            jitter => now.saturating_sub(OsRng.next_u64() % jitter.saturating_add(1)),
        }
    }
}

fn open(receiver: &Identity, wrapped: &Envelope) -> Result<ReceivedMessage, UnwrapError> {
    let sealed = unwrap(wrapped, receiver)?;
    unseal(&sealed, receiver)
}

/// [`Messenger::send`] with the default configuration.
pub fn send(sender: &Identity, receiver: &PublicKey, message: &str) -> Result<Envelope, SendError> {
    Messenger::default().send(sender, receiver, message)
}

/// [`Messenger::receive`] with the default configuration.
pub fn receive(receiver: &Identity, wrapped: &Envelope) -> Result<ReceivedMessage, NotRecoverable> {
    Messenger::default().receive(receiver, wrapped)
}
