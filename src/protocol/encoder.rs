//! Zero-Allocation Frame Encoder
//!
//! Encode frame client (CONNECT, PUBLISH, SUBSCRIBE, ...) langsung ke
//! pre-allocated buffer. Tidak ada alokasi setelah inisialisasi.

use super::message::{
    encode_remaining_length, PacketType, QoS, MAX_LENGTH_BYTES, MAX_REMAINING_LENGTH,
};

const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4;
const CLEAN_SESSION: u8 = 0x02;

/// Pre-allocated encoder buffer
///
/// Semua operasi encode dilakukan ke buffer internal. Setiap `encode_*`
/// mengembalikan slice ke frame yang baru ditulis, atau `None` kalau buffer
/// penuh (buffer tidak berubah dalam kasus itu).
pub struct Encoder {
    buffer: Box<[u8]>,
    write_pos: usize,
}

impl Encoder {
    /// Membuat encoder dengan buffer size tertentu
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            write_pos: 0,
        }
    }

    /// Reset encoder untuk reuse
    #[inline(always)]
    pub fn reset(&mut self) {
        self.write_pos = 0;
    }

    /// CONNECT dengan clean session dan keep-alive dalam detik
    pub fn encode_connect(&mut self, client_id: &str, keep_alive: u16) -> Option<&[u8]> {
        let body_len = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2 + prefixed_len(client_id)?;
        let start = self.begin(PacketType::Connect.type_byte(0), body_len)?;

        self.put_str(PROTOCOL_NAME);
        self.put(&[PROTOCOL_LEVEL, CLEAN_SESSION]);
        self.put(&keep_alive.to_be_bytes());
        self.put_str(client_id.as_bytes());

        Some(&self.buffer[start..self.write_pos])
    }

    /// PUBLISH. `message_id` hanya ditulis kalau `qos` di atas QoS 0.
    pub fn encode_publish(
        &mut self,
        topic: &str,
        qos: QoS,
        message_id: u16,
        payload: &[u8],
    ) -> Option<&[u8]> {
        let id_len = if qos == QoS::AtMostOnce { 0 } else { 2 };
        let body_len = prefixed_len(topic)? + id_len + payload.len();
        let start = self.begin(PacketType::Publish.type_byte((qos as u8) << 1), body_len)?;

        self.put_str(topic.as_bytes());
        if id_len > 0 {
            self.put(&message_id.to_be_bytes());
        }
        self.put(payload);

        Some(&self.buffer[start..self.write_pos])
    }

    /// SUBSCRIBE untuk satu atau lebih topic
    pub fn encode_subscribe(&mut self, message_id: u16, topics: &[(&str, QoS)]) -> Option<&[u8]> {
        let body_len = 2 + topics
            .iter()
            .map(|(topic, _)| prefixed_len(topic).map(|len| len + 1))
            .sum::<Option<usize>>()?;
        let start = self.begin(PacketType::Subscribe.type_byte(0x02), body_len)?;

        self.put(&message_id.to_be_bytes());
        for (topic, qos) in topics {
            self.put_str(topic.as_bytes());
            self.put(&[*qos as u8]);
        }

        Some(&self.buffer[start..self.write_pos])
    }

    pub fn encode_unsubscribe(&mut self, message_id: u16, topics: &[&str]) -> Option<&[u8]> {
        let body_len = 2 + topics
            .iter()
            .map(|topic| prefixed_len(topic))
            .sum::<Option<usize>>()?;
        let start = self.begin(PacketType::Unsubscribe.type_byte(0x02), body_len)?;

        self.put(&message_id.to_be_bytes());
        for topic in topics {
            self.put_str(topic.as_bytes());
        }

        Some(&self.buffer[start..self.write_pos])
    }

    pub fn encode_pingreq(&mut self) -> Option<&[u8]> {
        let start = self.begin(PacketType::Pingreq.type_byte(0), 0)?;
        Some(&self.buffer[start..self.write_pos])
    }

    pub fn encode_disconnect(&mut self) -> Option<&[u8]> {
        let start = self.begin(PacketType::Disconnect.type_byte(0), 0)?;
        Some(&self.buffer[start..self.write_pos])
    }

    /// Get current buffer content
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.write_pos]
    }

    /// Available space in buffer
    #[inline(always)]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.write_pos
    }

    /// Tulis fixed header kalau seluruh frame muat. Returns offset awal frame.
    #[inline]
    fn begin(&mut self, type_byte: u8, body_len: usize) -> Option<usize> {
        if body_len > MAX_REMAINING_LENGTH {
            return None;
        }

        let mut len_buf = [0u8; MAX_LENGTH_BYTES];
        let len_bytes = encode_remaining_length(body_len, &mut len_buf);
        if 1 + len_bytes + body_len > self.available() {
            return None;
        }

        let start = self.write_pos;
        self.put(&[type_byte]);
        self.put(&len_buf[..len_bytes]);
        Some(start)
    }

    // Kapasitas sudah dicek di `begin`
    #[inline(always)]
    fn put(&mut self, bytes: &[u8]) {
        self.buffer[self.write_pos..self.write_pos + bytes.len()].copy_from_slice(bytes);
        self.write_pos += bytes.len();
    }

    // Panjang sudah dicek lewat `prefixed_len`
    #[inline(always)]
    fn put_str(&mut self, bytes: &[u8]) {
        let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
        self.put(&len.to_be_bytes());
        self.put(bytes);
    }
}

/// Wire size of a u16 length-prefixed string, `None` if the prefix overflows.
#[inline]
fn prefixed_len(s: &str) -> Option<usize> {
    u16::try_from(s.len()).ok().map(|len| 2 + usize::from(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode, Packet};

    #[test]
    fn test_encode_publish_qos2_layout() {
        let mut encoder = Encoder::new(64);

        let frame = encoder
            .encode_publish("top", QoS::ExactlyOnce, 0x21, &[1, 2, 3])
            .unwrap();

        assert_eq!(
            frame,
            &[0x34, 10, 0x00, 0x03, b't', b'o', b'p', 0x00, 0x21, 1, 2, 3]
        );
    }

    #[test]
    fn test_encode_subscribe_decodes_back() {
        let mut encoder = Encoder::new(64);
        let frame = encoder
            .encode_subscribe(7, &[("a/b", QoS::AtMostOnce), ("c", QoS::AtLeastOnce)])
            .unwrap()
            .to_vec();

        let Packet::Subscribe(subscribe) = decode(&frame).unwrap() else {
            panic!("expected subscribe");
        };
        assert_eq!(subscribe.message_id, 7);
        assert_eq!(subscribe.topics.len(), 2);
        assert_eq!(subscribe.topics[1].topic, "c");
    }

    #[test]
    fn test_encoder_full_leaves_buffer_untouched() {
        let mut encoder = Encoder::new(8);

        assert!(encoder.encode_disconnect().is_some());
        assert!(encoder
            .encode_publish("topic", QoS::AtMostOnce, 0, b"too large")
            .is_none());
        assert_eq!(encoder.as_bytes(), &[0xe0, 0]);
        assert_eq!(encoder.available(), 6);
    }

    #[test]
    fn test_encoder_appends_frames() {
        let mut encoder = Encoder::new(64);

        encoder.encode_connect("c1", 60).unwrap();
        encoder.encode_pingreq().unwrap();
        let connect_len = encoder.as_bytes().len() - 2;

        assert_eq!(encoder.as_bytes()[0], 0x10);
        assert_eq!(&encoder.as_bytes()[connect_len..], &[0xc0, 0]);

        encoder.reset();
        assert!(encoder.as_bytes().is_empty());
    }

    #[test]
    fn test_string_longer_than_u16_is_rejected() {
        let mut encoder = Encoder::new(256 * 1024);
        let long = "a".repeat(usize::from(u16::MAX) + 1);

        assert!(encoder
            .encode_publish(&long, QoS::AtMostOnce, 0, b"x")
            .is_none());
        assert!(encoder.encode_connect(&long, 60).is_none());
        assert!(encoder
            .encode_subscribe(1, &[("ok", QoS::AtMostOnce), (long.as_str(), QoS::AtMostOnce)])
            .is_none());
        assert!(encoder.encode_unsubscribe(1, &[long.as_str()]).is_none());
        assert!(encoder.as_bytes().is_empty());
    }

    #[test]
    fn test_max_length_topic_decodes_back() {
        let mut encoder = Encoder::new(128 * 1024);
        let topic = "a".repeat(usize::from(u16::MAX));

        let frame = encoder
            .encode_publish(&topic, QoS::AtMostOnce, 0, b"x")
            .unwrap()
            .to_vec();

        let Packet::Publish(publish) = decode(&frame).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(publish.topic.len(), topic.len());
        assert_eq!(publish.payload, b"x");
    }

    #[test]
    fn test_encode_unsubscribe() {
        let mut encoder = Encoder::new(32);

        let frame = encoder.encode_unsubscribe(5, &["top"]).unwrap();
        assert_eq!(frame, &[0xa2, 7, 0x00, 0x05, 0x00, 0x03, b't', b'o', b'p']);
    }
}
