use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::drivers::try_update_location;
use crate::store::Store;

/// Payload carried over the channel in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

pub struct Subscription {
    pub id: ConnectionId,
    pub receiver: mpsc::Receiver<LocationUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOutcome {
    pub persisted: bool,
    pub delivered: usize,
}

struct Listener {
    id: ConnectionId,
    tx: mpsc::Sender<LocationUpdate>,
}

/// Per-subject rooms of listeners. Each room's listener list sits behind its
/// own map entry, so a publish holds only that room while it fans out and
/// every listener sees the room's updates in publish order.
pub struct LocationChannel {
    store: Arc<Store>,
    rooms: DashMap<String, Vec<Listener>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

pub fn room_name(subject: Uuid) -> String {
    format!("location_{subject}")
}

impl LocationChannel {
    pub fn new(store: Arc<Store>, buffer_size: usize) -> Self {
        Self {
            store,
            rooms: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn join(&self, subject: Uuid) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.buffer_size);
        let id = self.join_with(subject, tx);

        Subscription { id, receiver }
    }

    /// Registers an existing sender as a listener of the subject's room.
    pub fn join_with(&self, subject: Uuid, tx: mpsc::Sender<LocationUpdate>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.rooms
            .entry(room_name(subject))
            .or_default()
            .push(Listener { id, tx });

        debug!(subject = %subject, connection = id.0, "joined location room");
        id
    }

    /// Returns whether the connection was a member.
    pub fn leave(&self, subject: Uuid, id: ConnectionId) -> bool {
        let room = room_name(subject);
        let removed = match self.rooms.get_mut(&room) {
            Some(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|listener| listener.id != id);
                listeners.len() != before
            }
            None => false,
        };

        self.rooms.remove_if(&room, |_, listeners| listeners.is_empty());
        if removed {
            debug!(subject = %subject, connection = id.0, "left location room");
        }
        removed
    }

    /// Stores the position for `actor` when it names a known driver, then
    /// sends the update to everyone in the subject's room, sender included.
    pub fn publish(
        &self,
        subject: Uuid,
        update: LocationUpdate,
        actor: Option<Uuid>,
    ) -> PublishOutcome {
        let persisted = actor
            .map(|driver_id| {
                try_update_location(&self.store, driver_id, update.latitude, update.longitude)
            })
            .unwrap_or(false);

        let room = room_name(subject);
        let mut delivered = 0;
        let mut pruned = false;

        if let Some(mut listeners) = self.rooms.get_mut(&room) {
            listeners.retain(|listener| match listener.tx.try_send(update) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(subject = %subject, connection = listener.id.0, "listener buffer full; update dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    pruned = true;
                    false
                }
            });
        }

        if pruned {
            self.rooms.remove_if(&room, |_, listeners| listeners.is_empty());
        }

        debug!(subject = %subject, delivered, persisted, "location update published");
        PublishOutcome {
            persisted,
            delivered,
        }
    }

    pub fn listener_count(&self, subject: Uuid) -> usize {
        self.rooms
            .get(&room_name(subject))
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    pub fn total_listeners(&self) -> usize {
        self.rooms.iter().map(|room| room.len()).sum()
    }
}
