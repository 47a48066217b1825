//! # Event Bus
//!
//! Typed publish/subscribe channel owned by the framework. Listeners hold a
//! [`Subscription`] and receive every event published after they subscribed.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

use log::{debug, warn};
use tokio::sync::broadcast;

use crate::transport::{ChannelId, GuildId, UserId};

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkEvent {
    CommandInvoked {
        command: String,
        author: UserId,
        channel: ChannelId,
        guild: Option<GuildId>,
    },
    ConversationStarted {
        conversation: String,
        user: UserId,
        guild: Option<GuildId>,
    },
    ConversationCompleted {
        conversation: String,
        user: UserId,
        guild: Option<GuildId>,
    },
    ConversationCancelled {
        conversation: String,
        user: UserId,
        guild: Option<GuildId>,
    },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FrameworkEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish to all current subscribers; no subscribers is not an error
    pub fn publish(&self, event: FrameworkEvent) {
        if self.sender.send(event).is_err() {
            debug!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of an [`EventBus`]
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<FrameworkEvent>,
}

impl Subscription {
    /// Next event, or `None` once the bus is gone. Lagged events are skipped.
    pub async fn recv(&mut self) -> Option<FrameworkEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event subscriber lagged, skipped {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<FrameworkEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
