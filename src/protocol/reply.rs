//! Broker replies (CONNACK, SUBACK, UNSUBACK, PINGRESP)

use super::message::{encode_remaining_length, PacketType, QoS, MAX_LENGTH_BYTES};

/// CONNACK return code: connection accepted
pub const CONNECTION_ACCEPTED: u8 = 0x00;

#[inline]
pub fn connack(session_present: bool, return_code: u8) -> [u8; 4] {
    [
        PacketType::Connack.type_byte(0),
        2,
        session_present as u8,
        return_code,
    ]
}

/// SUBACK dengan satu return code per topic yang diminta
pub fn suback(message_id: u16, granted: &[QoS]) -> Vec<u8> {
    let body_len = 2 + granted.len();
    let mut len_buf = [0u8; MAX_LENGTH_BYTES];
    let len_bytes = encode_remaining_length(body_len, &mut len_buf);

    let mut frame = Vec::with_capacity(1 + len_bytes + body_len);
    frame.push(PacketType::Suback.type_byte(0));
    frame.extend_from_slice(&len_buf[..len_bytes]);
    frame.extend_from_slice(&message_id.to_be_bytes());
    frame.extend(granted.iter().map(|qos| *qos as u8));
    frame
}

#[inline]
pub fn unsuback(message_id: u16) -> [u8; 4] {
    let [hi, lo] = message_id.to_be_bytes();
    [PacketType::Unsuback.type_byte(0), 2, hi, lo]
}

#[inline]
pub fn pingresp() -> [u8; 2] {
    [PacketType::Pingresp.type_byte(0), 0]
}
