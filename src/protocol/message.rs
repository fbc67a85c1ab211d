//! MQTT Fixed Header
//!
//! Layout:
//! ┌─────────────────────────────────────────────────────┐
//! │ byte 0: packet type (4 bit) | flags (4 bit)         │
//! ├─────────────────────────────────────────────────────┤
//! │ Remaining length (1-4 bytes, 7 bit + continuation)  │
//! ├─────────────────────────────────────────────────────┤
//! │ Variable header + payload (remaining length bytes)  │
//! └─────────────────────────────────────────────────────┘
//!
//! Header di-parse langsung dari buffer tanpa alokasi. Parsing bersifat
//! spekulatif: kalau bytes belum lengkap, hasilnya `Ok(None)` dan tidak ada
//! yang dikonsumsi.

use super::error::FramingError;

/// Maximum value representable by the remaining length field.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;
/// Remaining length never spans more than this many bytes.
pub const MAX_LENGTH_BYTES: usize = 4;
/// Smallest possible frame: type byte plus a single zero length byte.
pub const MIN_FRAME_SIZE: usize = 2;

const CONTINUATION_BIT: u8 = 0x80;
const VALUE_MASK: u8 = 0x7f;

/// Tipe control packet MQTT (high nibble byte pertama)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    Connect = 1,
    Connack = 2,
    Publish = 3,
    Puback = 4,
    Pubrec = 5,
    Pubrel = 6,
    Pubcomp = 7,
    Subscribe = 8,
    Suback = 9,
    Unsubscribe = 10,
    Unsuback = 11,
    Pingreq = 12,
    Pingresp = 13,
    Disconnect = 14,
}

impl PacketType {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Connect),
            2 => Some(Self::Connack),
            3 => Some(Self::Publish),
            4 => Some(Self::Puback),
            5 => Some(Self::Pubrec),
            6 => Some(Self::Pubrel),
            7 => Some(Self::Pubcomp),
            8 => Some(Self::Subscribe),
            9 => Some(Self::Suback),
            10 => Some(Self::Unsubscribe),
            11 => Some(Self::Unsuback),
            12 => Some(Self::Pingreq),
            13 => Some(Self::Pingresp),
            14 => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// First byte of a frame of this type with the given flags.
    #[inline(always)]
    pub const fn type_byte(self, flags: u8) -> u8 {
        ((self as u8) << 4) | (flags & 0x0f)
    }
}

/// Quality of service level
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QoS {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::AtMostOnce),
            1 => Some(Self::AtLeastOnce),
            2 => Some(Self::ExactlyOnce),
            _ => None,
        }
    }
}

/// Parsed fixed header of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    /// Raw first byte (type + flags)
    pub type_byte: u8,
    /// Bytes following the length field
    pub remaining_length: usize,
    /// Type byte plus length field bytes
    pub header_len: usize,
}

impl FixedHeader {
    /// Parse header dari awal buffer.
    ///
    /// Returns `Ok(None)` kalau type byte atau length field belum lengkap.
    /// Hanya membaca bytes yang memang ada di `buf`.
    #[inline]
    pub fn parse(buf: &[u8]) -> Result<Option<Self>, FramingError> {
        let Some((&type_byte, rest)) = buf.split_first() else {
            return Ok(None);
        };

        Ok(decode_remaining_length(rest)?.map(|(remaining_length, len_bytes)| Self {
            type_byte,
            remaining_length,
            header_len: 1 + len_bytes,
        }))
    }

    /// Packet type nibble (belum divalidasi)
    #[inline(always)]
    pub fn type_bits(&self) -> u8 {
        self.type_byte >> 4
    }

    /// Type-specific flags nibble
    #[inline(always)]
    pub fn flags(&self) -> u8 {
        self.type_byte & 0x0f
    }

    /// Total frame size (header + body)
    #[inline(always)]
    pub fn frame_len(&self) -> usize {
        self.header_len + self.remaining_length
    }
}

/// Decode remaining length (variable byte integer, least significant first).
///
/// Returns `(value, bytes_used)`, `None` kalau length field terpotong.
#[inline]
pub fn decode_remaining_length(buf: &[u8]) -> Result<Option<(usize, usize)>, FramingError> {
    let mut value = 0usize;
    let mut multiplier = 1usize;

    for (i, &byte) in buf.iter().take(MAX_LENGTH_BYTES).enumerate() {
        value += (byte & VALUE_MASK) as usize * multiplier;
        if byte & CONTINUATION_BIT == 0 {
            return Ok(Some((value, i + 1)));
        }
        multiplier *= 128;
    }

    if buf.len() >= MAX_LENGTH_BYTES {
        Err(FramingError::MalformedRemainingLength)
    } else {
        Ok(None)
    }
}

/// Encode remaining length ke `out`. Returns jumlah bytes yang ditulis.
///
/// Values above [`MAX_REMAINING_LENGTH`] are truncated to four bytes, callers
/// check the bound first.
#[inline]
pub fn encode_remaining_length(mut len: usize, out: &mut [u8; MAX_LENGTH_BYTES]) -> usize {
    let mut i = 0;
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 && i + 1 < MAX_LENGTH_BYTES {
            byte |= CONTINUATION_BIT;
        }
        out[i] = byte;
        i += 1;
        if len == 0 || i == MAX_LENGTH_BYTES {
            return i;
        }
    }
}
