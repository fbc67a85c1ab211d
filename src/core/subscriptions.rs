//! Subscription table: topic → ordered subscribers
//!
//! Topic dicocokkan dengan string equality, tanpa wildcard. Urutan subscriber
//! dalam satu topic mengikuti urutan subscribe pertama kali.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::network::ConnectionId;
use crate::protocol::QoS;

/// One (topic, connection) entry.
pub struct Subscription<C> {
    pub connection_id: ConnectionId,
    /// Message id of the most recent SUBSCRIBE for this entry
    pub message_id: u16,
    /// Requested QoS, stored only
    pub qos: QoS,
    connection: Weak<C>,
}

impl<C> Subscription<C> {
    /// Upgrade ke connection, `None` kalau transport sudah melepasnya
    #[inline]
    pub fn connection(&self) -> Option<Arc<C>> {
        self.connection.upgrade()
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.connection.strong_count() > 0
    }
}

pub struct SubscriptionTable<C> {
    topics: HashMap<String, Vec<Subscription<C>>>,
}

impl<C> Default for SubscriptionTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SubscriptionTable<C> {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
        }
    }

    /// Insert atau replace entry (topic, connection_id).
    ///
    /// Returns `true` kalau entry baru, `false` kalau entry lama di-update.
    pub fn subscribe(
        &mut self,
        topic: &str,
        connection_id: ConnectionId,
        connection: &Arc<C>,
        message_id: u16,
        qos: QoS,
    ) -> bool {
        let entries = self.topics.entry(topic.to_owned()).or_default();

        if let Some(existing) = entries
            .iter_mut()
            .find(|s| s.connection_id == connection_id)
        {
            existing.message_id = message_id;
            existing.qos = qos;
            existing.connection = Arc::downgrade(connection);
            return false;
        }

        entries.push(Subscription {
            connection_id,
            message_id,
            qos,
            connection: Arc::downgrade(connection),
        });
        true
    }

    /// Hapus satu entry. Returns `true` kalau entry ada.
    pub fn unsubscribe(&mut self, topic: &str, connection_id: ConnectionId) -> bool {
        let Some(entries) = self.topics.get_mut(topic) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|s| s.connection_id != connection_id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Hapus semua entry milik satu connection. Returns jumlah yang dihapus.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> usize {
        let mut removed = 0;
        self.topics.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|s| s.connection_id != connection_id);
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }

    /// Live subscribers of `topic`, in subscription order.
    ///
    /// Entries whose connection was dropped are pruned on the way.
    pub fn subscribers(&mut self, topic: &str) -> Vec<Arc<C>> {
        let Some(entries) = self.topics.get_mut(topic) else {
            return Vec::new();
        };

        let mut live = Vec::with_capacity(entries.len());
        entries.retain(|s| match s.connection() {
            Some(conn) => {
                live.push(conn);
                true
            }
            None => false,
        });

        if entries.is_empty() {
            self.topics.remove(topic);
        }
        live
    }

    pub fn get(&self, topic: &str, connection_id: ConnectionId) -> Option<&Subscription<C>> {
        self.topics
            .get(topic)?
            .iter()
            .find(|s| s.connection_id == connection_id)
    }

    /// Entries whose connection is still alive. Dead entries are only
    /// removed by [`subscribers`](Self::subscribers), but never counted.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map_or(0, |entries| entries.iter().filter(|s| s.is_live()).count())
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Total entries over all topics
    pub fn len(&self) -> usize {
        self.topics.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
