//! Shared helpers untuk integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hermes_mqtt::protocol::QoS;
use hermes_mqtt::{Connection, ConnectionId, Encoder};
use parking_lot::Mutex;

pub type Payload = Vec<u8>;

/// Connection yang mencatat semua payload dan reply frame
pub struct TestConnection {
    id: ConnectionId,
    connected: AtomicBool,
    payloads: Mutex<Vec<Payload>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl TestConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::next(),
            connected: AtomicBool::new(false),
            payloads: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn connected() -> Arc<Self> {
        let conn = Self::new();
        conn.set_connected(true);
        conn
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads.lock().clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }
}

impl Connection for TestConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    fn deliver(&self, payload: &[u8]) {
        self.payloads.lock().push(payload.to_vec());
    }

    fn send(&self, frame: &[u8]) {
        self.sent.lock().push(frame.to_vec());
    }
}

/// SUBSCRIBE frame dengan header 0x8b, satu topic, QoS 0
pub fn subscribe_msg(topic: &str, msg_id: u16) -> Vec<u8> {
    let remaining_length = topic.len() + 2 + 2 + 1;
    let mut msg = vec![0x8b, remaining_length as u8];
    msg.extend_from_slice(&msg_id.to_be_bytes());
    msg.extend_from_slice(&(topic.len() as u16).to_be_bytes());
    msg.extend_from_slice(topic.as_bytes());
    msg.push(0);
    msg
}

pub fn publish_msg(topic: &str, payload: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new(16 * 1024);
    encoder
        .encode_publish(topic, QoS::AtMostOnce, 0, payload)
        .expect("publish fits in encoder")
        .to_vec()
}

pub fn disconnect_msg() -> Vec<u8> {
    vec![0xe0, 0]
}
