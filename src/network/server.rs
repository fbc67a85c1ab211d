//! Broker dispatcher
//!
//! Decode setiap frame lengkap lalu terapkan policy: subscription table,
//! connection state, atau fan-out payload ke subscriber.
//!
//! Satu `Server` dipakai bersama oleh semua connection di broker yang sama.
//! `Server` murah di-clone (shared `Arc`), dan semua akses ke subscription
//! table lewat satu mutex.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::connection::{Connection, ConnectionId};
use crate::config::{MalformedPolicy, ServerConfig};
use crate::core::SubscriptionTable;
use crate::protocol::{self, reply, DecodeError, Packet, QoS, Subscribe, Unsubscribe};

/// MQTT broker dispatcher
pub struct Server<C> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    subscriptions: Mutex<SubscriptionTable<C>>,
    config: ServerConfig,
}

impl<C> Clone for Server<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection> Default for Server<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Server<C> {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscriptions: Mutex::new(SubscriptionTable::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Fresh id untuk connection baru, unik selama proses berjalan
    #[inline]
    pub fn new_connection_id(&self) -> ConnectionId {
        ConnectionId::next()
    }

    /// Handle satu frame lengkap (fixed header ikut) dari `connection`.
    ///
    /// Frame yang gagal di-decode dibuang; error dikembalikan supaya caller
    /// bisa menghitung atau me-log-nya, tapi stream tetap jalan.
    pub fn handle_message(&self, connection: &Arc<C>, frame: &[u8]) -> Result<(), DecodeError> {
        let packet = match protocol::decode(frame) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(
                    connection = %connection.id(),
                    len = frame.len(),
                    error = %e,
                    "dropping malformed frame"
                );
                if self.inner.config.malformed == MalformedPolicy::Disconnect {
                    self.disconnect(connection.as_ref());
                }
                return Err(e);
            }
        };

        trace!(
            connection = %connection.id(),
            packet = ?packet.packet_type(),
            len = frame.len(),
            "dispatch"
        );

        match packet {
            Packet::Connect => {
                connection.set_connected(true);
                let connack = reply::connack(false, reply::CONNECTION_ACCEPTED);
                self.reply(connection.as_ref(), &connack);
            }
            Packet::Subscribe(subscribe) => self.on_subscribe(connection, subscribe),
            Packet::Unsubscribe(unsubscribe) => {
                self.on_unsubscribe(connection.as_ref(), unsubscribe)
            }
            Packet::Publish(publish) => {
                self.publish(publish.topic, publish.payload);
            }
            Packet::Ack {
                packet_type,
                message_id,
            } => {
                // QoS > 0 bookkeeping belum ada, ack cukup dicatat
                trace!(connection = %connection.id(), ?packet_type, message_id, "ignoring ack");
            }
            Packet::PingReq => self.reply(connection.as_ref(), &reply::pingresp()),
            Packet::Disconnect => self.disconnect(connection.as_ref()),
        }

        Ok(())
    }

    /// Fan-out `payload` ke semua subscriber `topic`.
    ///
    /// Returns jumlah subscriber yang menerima. Topic tanpa subscriber
    /// bukan error.
    pub fn publish(&self, topic: &str, payload: &[u8]) -> usize {
        // Kumpulkan dulu, deliver setelah lock dilepas
        let subscribers = self.inner.subscriptions.lock().subscribers(topic);

        for subscriber in &subscribers {
            subscriber.deliver(payload);
        }

        trace!(topic, len = payload.len(), subscribers = subscribers.len(), "published");
        subscribers.len()
    }

    /// Mark `connection` disconnected and drop all its subscriptions.
    pub fn disconnect(&self, connection: &C) {
        connection.set_connected(false);
        let removed = self
            .inner
            .subscriptions
            .lock()
            .remove_connection(connection.id());

        debug!(connection = %connection.id(), removed, "disconnected");
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.subscriptions.lock().subscriber_count(topic)
    }

    /// Message id dan QoS dari entry (topic, connection), kalau ada
    pub fn subscription(&self, topic: &str, connection_id: ConnectionId) -> Option<(u16, QoS)> {
        self.inner
            .subscriptions
            .lock()
            .get(topic, connection_id)
            .map(|s| (s.message_id, s.qos))
    }

    /// Snapshot of topics with at least one subscriber
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .inner
            .subscriptions
            .lock()
            .topics()
            .map(str::to_owned)
            .collect();
        topics.sort_unstable();
        topics
    }

    fn on_subscribe(&self, connection: &Arc<C>, subscribe: Subscribe<'_>) {
        let id = connection.id();
        {
            let mut table = self.inner.subscriptions.lock();
            for request in &subscribe.topics {
                let added = table.subscribe(
                    request.topic,
                    id,
                    connection,
                    subscribe.message_id,
                    request.qos,
                );
                debug!(
                    connection = %id,
                    topic = request.topic,
                    message_id = subscribe.message_id,
                    added,
                    "subscribed"
                );
            }
        }

        // Delivery selalu QoS 0
        let granted = vec![QoS::AtMostOnce; subscribe.topics.len()];
        self.reply(connection.as_ref(), &reply::suback(subscribe.message_id, &granted));
    }

    fn on_unsubscribe(&self, connection: &C, unsubscribe: Unsubscribe<'_>) {
        let id = connection.id();
        {
            let mut table = self.inner.subscriptions.lock();
            for topic in &unsubscribe.topics {
                let removed = table.unsubscribe(topic, id);
                debug!(connection = %id, topic, removed, "unsubscribed");
            }
        }

        self.reply(connection, &reply::unsuback(unsubscribe.message_id));
    }

    #[inline]
    fn reply(&self, connection: &C, frame: &[u8]) {
        if self.inner.config.send_replies {
            connection.send(frame);
        }
    }
}
