//! Delivery loop.
//!
//! Pulls Wrapped envelopes off a [`Subscription`] and runs `receive` on each.
//! Envelopes that cannot be opened are counted and logged, never fatal: a
//! relay is free to push anything at a subscriber.

use tracing::{debug, warn};

use veil_crypto::Identity;

use crate::protocol::Messenger;
use crate::seal::ReceivedMessage;
use crate::transport::Subscription;

/// Outcome counters for one [`Inbox::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxStats {
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Inbox {
    messenger: Messenger,
}

impl Inbox {
    pub fn new(messenger: Messenger) -> Self {
        Self { messenger }
    }

    /// Receive until the subscription ends, handing each recovered message
    /// to `handler`.
    pub async fn run<F>(
        &self,
        subscription: Subscription,
        receiver: &Identity,
        handler: F,
    ) -> InboxStats
    where
        F: FnMut(ReceivedMessage),
    {
        self.run_until(subscription, receiver, u64::MAX, handler).await
    }

    /// Like [`Inbox::run`], but returns once `limit` messages were delivered.
    pub async fn run_until<F>(
        &self,
        mut subscription: Subscription,
        receiver: &Identity,
        limit: u64,
        mut handler: F,
    ) -> InboxStats
    where
        F: FnMut(ReceivedMessage),
    {
        let mut stats = InboxStats::default();

        while stats.delivered < limit {
            let Some(envelope) = subscription.next().await else {
                break;
            };
            match self.messenger.receive(receiver, &envelope) {
                Ok(message) => {
                    stats.delivered += 1;
                    handler(message);
                }
                Err(e) => {
                    stats.dropped += 1;
                    warn!(envelope_id = %envelope.id_hex(), "{e}");
                }
            }
        }

        debug!(delivered = stats.delivered, dropped = stats.dropped, "inbox stopped");
        stats
    }
}
