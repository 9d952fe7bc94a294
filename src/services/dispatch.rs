use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::database::entities::{notifications, users};

/// Payload pushed to a recipient's live channels. Mirrors the durable
/// notification row plus the denormalized sender fields clients render.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationPush {
    pub id: i32,
    pub message: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: i32,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub is_read: bool,
}

impl NotificationPush {
    pub fn from_parts(notification: &notifications::Model, sender: &users::Model) -> Self {
        Self {
            id: notification.id,
            message: notification.message.clone(),
            kind: notification.kind.clone(),
            created_at: notification.created_at,
            sender_id: sender.id,
            sender_name: sender.name.clone(),
            sender_avatar: sender.avatar_url.clone(),
            is_read: notification.is_read,
        }
    }
}

/// A recipient that falls this far behind starts losing pushes; the ledger
/// still holds everything, so a lagging client just re-queries.
const CHANNEL_CAPACITY: usize = 32;

/// Best-effort fan-out of freshly committed notifications to connected
/// clients. Channels are keyed by recipient identity, not connection id: a
/// recipient may hold zero or more live subscriptions at once. Dispatch
/// never blocks and never fails the caller; the durable ledger write has
/// already happened by the time this runs.
#[derive(Clone, Default)]
pub struct DeliveryDispatcher {
    channels: Arc<RwLock<HashMap<i32, broadcast::Sender<NotificationPush>>>>,
}

impl DeliveryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a live channel for a recipient. Multiple subscriptions for the
    /// same recipient each receive every push.
    pub async fn subscribe(&self, recipient_id: i32) -> broadcast::Receiver<NotificationPush> {
        let mut channels = self.channels.write().await;
        channels
            .entry(recipient_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Push to whichever channels the recipient currently holds. A
    /// recipient with no live channel is a silent no-op.
    pub async fn dispatch(&self, recipient_id: i32, push: NotificationPush) {
        let channels = self.channels.read().await;
        let Some(tx) = channels.get(&recipient_id) else {
            debug!("no live channel for user {}, skipping push", recipient_id);
            return;
        };

        if tx.receiver_count() == 0 {
            drop(channels);
            self.prune(recipient_id).await;
            return;
        }

        if let Err(err) = tx.send(push) {
            warn!("realtime push to user {} dropped: {}", recipient_id, err);
        }
    }

    /// Number of live subscriptions for a recipient.
    pub async fn subscriber_count(&self, recipient_id: i32) -> usize {
        self.channels
            .read()
            .await
            .get(&recipient_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    async fn prune(&self, recipient_id: i32) {
        let mut channels = self.channels.write().await;
        let dead = channels
            .get(&recipient_id)
            .map(|tx| tx.receiver_count() == 0)
            .unwrap_or(false);
        if dead {
            channels.remove(&recipient_id);
            debug!("pruned dead channel for user {}", recipient_id);
        }
    }
}
