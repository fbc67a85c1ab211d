//! Zero-copy packet decoder
//!
//! Satu frame lengkap masuk, satu [`Packet`] keluar. Topic dan payload
//! dipinjam langsung dari frame, tidak ada copy.

use super::error::DecodeError;
use super::message::{FixedHeader, PacketType, QoS};

/// Decoded control packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet<'a> {
    Connect,
    Publish(Publish<'a>),
    Subscribe(Subscribe<'a>),
    Unsubscribe(Unsubscribe<'a>),
    /// PUBACK / PUBREC / PUBREL / PUBCOMP
    Ack { packet_type: PacketType, message_id: u16 },
    PingReq,
    Disconnect,
}

impl Packet<'_> {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect => PacketType::Connect,
            Packet::Publish(_) => PacketType::Publish,
            Packet::Subscribe(_) => PacketType::Subscribe,
            Packet::Unsubscribe(_) => PacketType::Unsubscribe,
            Packet::Ack { packet_type, .. } => *packet_type,
            Packet::PingReq => PacketType::Pingreq,
            Packet::Disconnect => PacketType::Disconnect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish<'a> {
    pub topic: &'a str,
    pub qos: QoS,
    pub dup: bool,
    pub retain: bool,
    /// Only present when `qos` is above [`QoS::AtMostOnce`]
    pub message_id: Option<u16>,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe<'a> {
    pub message_id: u16,
    pub topics: Vec<TopicRequest<'a>>,
}

/// One topic entry of a SUBSCRIBE packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRequest<'a> {
    pub topic: &'a str,
    pub qos: QoS,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscribe<'a> {
    pub message_id: u16,
    pub topics: Vec<&'a str>,
}

/// Decode satu frame lengkap (fixed header ikut).
pub fn decode(frame: &[u8]) -> Result<Packet<'_>, DecodeError> {
    let header = FixedHeader::parse(frame)?.ok_or(DecodeError::Truncated {
        field: "fixed header",
        need: frame.len() + 1,
        have: frame.len(),
    })?;

    if frame.len() != header.frame_len() {
        return Err(DecodeError::LengthMismatch {
            declared: header.frame_len(),
            actual: frame.len(),
        });
    }

    let packet_type = PacketType::from_u8(header.type_bits())
        .ok_or(DecodeError::UnknownPacketType(header.type_bits()))?;
    let mut body = Reader::new(&frame[header.header_len..]);

    match packet_type {
        // Isi CONNECT ditangani upstream, di sini cukup keberadaannya
        PacketType::Connect => Ok(Packet::Connect),
        PacketType::Publish => decode_publish(header.flags(), &mut body).map(Packet::Publish),
        PacketType::Subscribe => decode_subscribe(&mut body).map(Packet::Subscribe),
        PacketType::Unsubscribe => decode_unsubscribe(&mut body).map(Packet::Unsubscribe),
        PacketType::Puback | PacketType::Pubrec | PacketType::Pubrel | PacketType::Pubcomp => {
            let message_id = body.read_u16("message id")?;
            Ok(Packet::Ack {
                packet_type,
                message_id,
            })
        }
        PacketType::Pingreq => body.finish_empty(packet_type).map(|()| Packet::PingReq),
        PacketType::Disconnect => body.finish_empty(packet_type).map(|()| Packet::Disconnect),
        PacketType::Connack | PacketType::Suback | PacketType::Unsuback | PacketType::Pingresp => {
            Err(DecodeError::UnexpectedPacket(packet_type))
        }
    }
}

fn decode_publish<'a>(flags: u8, body: &mut Reader<'a>) -> Result<Publish<'a>, DecodeError> {
    let qos_bits = (flags >> 1) & 0x03;
    let qos = QoS::from_u8(qos_bits).ok_or(DecodeError::InvalidQos(qos_bits))?;

    let topic = body.read_str("topic")?;
    let message_id = match qos {
        QoS::AtMostOnce => None,
        QoS::AtLeastOnce | QoS::ExactlyOnce => Some(body.read_u16("message id")?),
    };

    Ok(Publish {
        topic,
        qos,
        dup: flags & 0x08 != 0,
        retain: flags & 0x01 != 0,
        message_id,
        payload: body.rest(),
    })
}

fn decode_subscribe<'a>(body: &mut Reader<'a>) -> Result<Subscribe<'a>, DecodeError> {
    let message_id = body.read_u16("message id")?;

    let mut topics = Vec::new();
    while body.remaining() > 0 {
        let topic = body.read_str("topic")?;
        let requested = body.read_u8("requested QoS")?;
        let qos = QoS::from_u8(requested).ok_or(DecodeError::InvalidQos(requested))?;
        topics.push(TopicRequest { topic, qos });
    }

    if topics.is_empty() {
        return Err(DecodeError::NoTopics(PacketType::Subscribe));
    }

    Ok(Subscribe { message_id, topics })
}

fn decode_unsubscribe<'a>(body: &mut Reader<'a>) -> Result<Unsubscribe<'a>, DecodeError> {
    let message_id = body.read_u16("message id")?;

    let mut topics = Vec::new();
    while body.remaining() > 0 {
        topics.push(body.read_str("topic")?);
    }

    if topics.is_empty() {
        return Err(DecodeError::NoTopics(PacketType::Unsubscribe));
    }

    Ok(Unsubscribe { message_id, topics })
}

/// Cursor over the body of one frame. Every read is bounds-checked against
/// the frame, never against the surrounding buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[inline(always)]
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline(always)]
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                field,
                need: n,
                have: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1, field)?[0])
    }

    #[inline]
    fn read_u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2, field)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Length-prefixed UTF-8 string
    #[inline]
    fn read_str(&mut self, field: &'static str) -> Result<&'a str, DecodeError> {
        let len = self.read_u16(field)? as usize;
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    #[inline]
    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }

    fn finish_empty(&self, packet: PacketType) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            len => Err(DecodeError::UnexpectedBody { packet, len }),
        }
    }
}
