
use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use rand::Rng;

use crate::attributes::*;
use crate::error::*;

/// Fixed value (RFC 5389 Section 6) that lets a STUN message be picked out
/// of a stream multiplexed with other protocols on the same port.
pub const MAGIC_COOKIE: u32 = 0x2112A442;
pub const ATTRIBUTE_HEADER_SIZE: usize = 4;
pub const MESSAGE_HEADER_SIZE: usize = 20;

/// Length, in bytes, of a STUN transaction ID (96 bits).
pub const TRANSACTION_ID_SIZE: usize = 12;

/// Length of the RFC 3489 transaction ID this crate never produces but
/// tolerates while deciding whether a buffer merely *looks* like a STUN
/// header in [`is_message_with_legacy`].
pub const LEGACY_TRANSACTION_ID_SIZE: usize = 16;

/// Encodes a value as one or more attributes/header fields of a [`Message`].
pub trait Setter {
    fn add_to(&self, m: &mut Message) -> Result<()>;
}

/// Decodes a value out of a [`Message`].
pub trait Getter {
    fn get_from(&mut self, m: &Message) -> Result<()>;
}

/// Validates some property of an already-decoded [`Message`].
pub trait Checker {
    fn check(&self, m: &Message) -> Result<()>;
}

fn has_stun_header_shape(b: &[u8]) -> bool {
    b.len() >= MESSAGE_HEADER_SIZE
        && u32::from_be_bytes([b[4], b[5], b[6], b[7]]) == MAGIC_COOKIE
        && b[0] & 0xc0 == 0
}

/// True if `b` looks like the start of a STUN message: long enough for a
/// header, top two type bits clear, and the magic cookie in place. Useful
/// for demultiplexing a socket shared with another protocol; does not
/// guarantee [`Message::decode`] will succeed.
pub fn is_message(b: &[u8]) -> bool {
    has_stun_header_shape(b)
}

/// As [`is_message`], but when `accept_legacy` is set, also accepts RFC
/// 3489-style headers that predate the magic cookie: anything long enough
/// for a header with the top two type bits clear.
pub fn is_message_with_legacy(b: &[u8], accept_legacy: bool) -> bool {
    has_stun_header_shape(b) || (accept_legacy && b.len() >= MESSAGE_HEADER_SIZE && b[0] & 0xc0 == 0)
}

/// A decoded (or decodable) STUN packet: header fields plus an attribute
/// list, backed by the exact wire bytes in `raw`. Field values and
/// attribute values borrowed out of a `Message` are only valid until `raw`
/// is next mutated.
#[derive(Default, Debug, Clone)]
pub struct Message {
    pub typ: MessageType,
    pub length: u32,
    pub transaction_id: TransactionId,
    pub attributes: Attributes,
    pub raw: Vec<u8>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} l={} attrs={} id={}",
            self.typ,
            self.length,
            self.attributes.0.len(),
            BASE64_STANDARD.encode(self.transaction_id.0),
        )
    }
}

/// Two messages are equal when their header fields and attributes match;
/// `raw` (which may differ only in padding/whitespace) is ignored.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.typ == other.typ
            && self.transaction_id == other.transaction_id
            && self.length == other.length
            && self.attributes == other.attributes
    }
}

const DEFAULT_RAW_CAPACITY: usize = 120;

impl Setter for Message {
    /// Copies `self`'s transaction ID onto `b`, for crafting a response
    /// that correlates with this message.
    fn add_to(&self, b: &mut Message) -> Result<()> {
        b.transaction_id = self.transaction_id;
        b.write_transaction_id();
        Ok(())
    }
}

impl Message {
    /// A message with a pre-allocated, header-sized `raw` buffer.
    pub fn new() -> Self {
        let mut raw = Vec::with_capacity(DEFAULT_RAW_CAPACITY);
        raw.extend(std::iter::repeat(0).take(MESSAGE_HEADER_SIZE));
        Message {
            raw,
            ..Default::default()
        }
    }

    pub fn marshal_binary(&self) -> Result<Vec<u8>> {
        Ok(self.raw.clone())
    }

    pub fn unmarshal_binary(&mut self, data: &[u8]) -> Result<()> {
        self.raw.clear();
        self.raw.extend_from_slice(data);
        self.decode()
    }

    /// Replaces the transaction ID with fresh random bytes and writes it
    /// into `raw`.
    pub fn new_transaction_id(&mut self) -> Result<()> {
        rand::thread_rng().fill(&mut self.transaction_id.0);
        self.write_transaction_id();
        Ok(())
    }

    /// Clears attributes and the underlying buffer, ready for reuse.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.length = 0;
        self.attributes.0.clear();
    }

    /// Ensures `raw` is at least `n` bytes long, zero-filling the tail. If
    /// `resize` is set and `raw` is already that long or longer, it is
    /// truncated down to exactly `n`.
    fn grow(&mut self, n: usize, resize: bool) {
        match self.raw.len().cmp(&n) {
            std::cmp::Ordering::Less => self.raw.resize(n, 0),
            _ if resize => self.raw.resize(n, 0),
            _ => {}
        }
    }

    /// Appends a new attribute. The value is copied, so callers may reuse
    /// their buffer. Fails with [`Error::DuplicateAttribute`] if `t` is
    /// already present, [`Error::FingerprintBeforeIntegrity`] if FINGERPRINT
    /// was already written (it must be the last attribute), or
    /// [`Error::ContextViolation`] if anything but FINGERPRINT is appended
    /// after MESSAGE-INTEGRITY.
    pub fn add(&mut self, t: AttrType, v: &[u8]) -> Result<()> {
        if self.contains(t) {
            return Err(Error::DuplicateAttribute);
        }
        if self.contains(ATTR_FINGERPRINT) {
            return Err(Error::FingerprintBeforeIntegrity);
        }
        if t != ATTR_FINGERPRINT && self.contains(ATTR_MESSAGE_INTEGRITY) {
            return Err(Error::ContextViolation(
                "attribute added after MESSAGE-INTEGRITY",
            ));
        }
        self.append_attribute(t, v);
        Ok(())
    }

    /// Appends the TLV for `(t, v)` to `raw` (with padding) and records it
    /// in `attributes`, without the duplicate/ordering checks `add` does.
    /// Safe to call from `write_attributes`, which only ever re-appends
    /// attributes it just drained from `self.attributes`.
    fn append_attribute(&mut self, t: AttrType, v: &[u8]) {
        let padded_len = nearest_padded_value_length(v.len());
        let start = MESSAGE_HEADER_SIZE + self.length as usize;
        let end = start + ATTRIBUTE_HEADER_SIZE + padded_len;
        self.grow(end, true);

        let tlv = &mut self.raw[start..end];
        tlv[0..2].copy_from_slice(&t.value().to_be_bytes());
        tlv[2..4].copy_from_slice(&(v.len() as u16).to_be_bytes());
        tlv[ATTRIBUTE_HEADER_SIZE..ATTRIBUTE_HEADER_SIZE + v.len()].copy_from_slice(v);
        for pad_byte in &mut tlv[ATTRIBUTE_HEADER_SIZE + v.len()..] {
            *pad_byte = 0;
        }

        self.length += (ATTRIBUTE_HEADER_SIZE + padded_len) as u32;
        self.attributes.0.push(RawAttribute {
            typ: t,
            length: v.len() as u16,
            value: v.to_vec(),
        });
        self.write_length();
    }

    pub fn write_length(&mut self) {
        self.grow(4, false);
        self.raw[2..4].copy_from_slice(&(self.length as u16).to_be_bytes());
    }

    pub fn write_header(&mut self) {
        self.grow(MESSAGE_HEADER_SIZE, false);
        self.write_type();
        self.write_length();
        self.raw[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        self.raw[8..MESSAGE_HEADER_SIZE].copy_from_slice(&self.transaction_id.0);
    }

    pub fn write_transaction_id(&mut self) {
        self.raw[8..MESSAGE_HEADER_SIZE].copy_from_slice(&self.transaction_id.0);
    }

    /// Re-encodes every attribute currently in `attributes` onto `raw`,
    /// draining and rebuilding the list in the process (so each one goes
    /// through the same padding/bookkeeping path as a fresh `add`).
    pub fn write_attributes(&mut self) {
        for a in self.attributes.0.drain(..).collect::<Vec<_>>() {
            self.append_attribute(a.typ, &a.value);
        }
    }

    pub fn write_type(&mut self) {
        self.grow(2, false);
        self.raw[..2].copy_from_slice(&self.typ.value().to_be_bytes());
    }

    pub fn set_type(&mut self, t: MessageType) {
        self.typ = t;
        self.write_type();
    }

    /// Rebuilds `raw` from scratch out of the header fields and attributes.
    pub fn encode(&mut self) {
        self.raw.clear();
        self.length = 0;
        self.write_header();
        self.write_attributes();
    }

    /// Parses `raw` into the header fields and attribute list.
    pub fn decode(&mut self) -> Result<()> {
        let header = &self.raw;
        if header.len() < MESSAGE_HEADER_SIZE {
            return Err(Error::TruncatedMessage);
        }

        let typ_value = u16::from_be_bytes([header[0], header[1]]);
        let body_len = u16::from_be_bytes([header[2], header[3]]) as usize;
        let cookie = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        if cookie != MAGIC_COOKIE {
            return Err(Error::BadMagicCookie);
        }
        if header.len() < MESSAGE_HEADER_SIZE + body_len {
            return Err(Error::TruncatedMessage);
        }

        self.typ.read_value(typ_value);
        self.length = body_len as u32;
        self.transaction_id
            .0
            .copy_from_slice(&header[8..MESSAGE_HEADER_SIZE]);

        let body = &self.raw[MESSAGE_HEADER_SIZE..MESSAGE_HEADER_SIZE + body_len];
        self.attributes.0 = parse_attributes(body)?;

        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        Ok(writer.write(&self.raw)?)
    }

    /// Reads a message out of `reader` into `raw` (to EOF; STUN has no
    /// length-prefixed framing below the message itself), then decodes it.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<usize> {
        self.raw.clear();
        let n = reader.read_to_end(&mut self.raw)?;
        self.decode()?;
        Ok(n)
    }

    /// Decodes `buf` into `self`. Any error leaves `self` partially decoded.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.raw.clear();
        self.raw.extend_from_slice(buf);
        self.decode()?;
        Ok(buf.len())
    }

    /// Copies `self`'s wire bytes into `b` and decodes them there, so later
    /// mutations of `self` can't affect `b`.
    pub fn clone_to(&self, b: &mut Message) -> Result<()> {
        b.raw.clear();
        b.raw.extend_from_slice(&self.raw);
        b.decode()
    }

    pub fn contains(&self, t: AttrType) -> bool {
        self.attributes.contains(t)
    }

    /// Removes and returns the attribute of type `t`, if present. Does not
    /// touch `raw`; callers needing a consistent wire form afterwards must
    /// call `encode()`.
    pub fn remove(&mut self, t: AttrType) -> Option<RawAttribute> {
        let idx = self.attributes.0.iter().position(|a| a.typ == t)?;
        Some(self.attributes.0.remove(idx))
    }

    /// Appends MESSAGE-INTEGRITY (if given) and then FINGERPRINT (if
    /// requested) — the only order RFC 5389 allows, since FINGERPRINT must
    /// cover MESSAGE-INTEGRITY's bytes.
    pub fn finish(
        &mut self,
        integrity: Option<&crate::integrity::MessageIntegrity>,
        with_fingerprint: bool,
    ) -> Result<()> {
        if let Some(mi) = integrity {
            mi.add_to(self)?;
        }
        if with_fingerprint {
            crate::fingerprint::FINGERPRINT.add_to(self)?;
        }
        Ok(())
    }

    /// Returns the value of the first attribute of type `t`, or
    /// [`Error::AttributeNotFound`].
    pub fn get(&self, t: AttrType) -> Result<Vec<u8>> {
        let (attr, found) = self.attributes.get(t);
        if found {
            Ok(attr.value)
        } else {
            Err(Error::AttributeNotFound)
        }
    }

    /// Resets `self` and applies `setters` in order, stopping at the first
    /// error.
    pub fn build(&mut self, setters: &[Box<dyn Setter>]) -> Result<()> {
        self.reset();
        self.write_header();
        for s in setters {
            s.add_to(self)?;
        }
        Ok(())
    }

    /// Runs `checkers` against `self` in order, stopping at the first error.
    pub fn check<C: Checker>(&self, checkers: &[C]) -> Result<()> {
        checkers.iter().try_for_each(|c| c.check(self))
    }

    /// Runs `getters` against `self` in order, stopping at the first error.
    pub fn parse<G: Getter>(&self, getters: &mut [G]) -> Result<()> {
        getters.iter_mut().try_for_each(|g| g.get_from(self))
    }
}

/// Splits a decoded message body into its attribute TLVs, rejecting
/// truncated headers/values and duplicate attribute types.
fn parse_attributes(body: &[u8]) -> Result<Vec<RawAttribute>> {
    let mut attrs = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = body;

    while !cursor.is_empty() {
        if cursor.len() < ATTRIBUTE_HEADER_SIZE {
            return Err(Error::BadAttributeLength);
        }

        let typ = compat_attr_type(u16::from_be_bytes([cursor[0], cursor[1]]));
        let value_len = u16::from_be_bytes([cursor[2], cursor[3]]) as usize;
        let padded_len = nearest_padded_value_length(value_len);
        cursor = &cursor[ATTRIBUTE_HEADER_SIZE..];

        if cursor.len() < padded_len {
            return Err(Error::BadAttributeLength);
        }

        if !seen.insert(typ) {
            return Err(Error::DuplicateAttribute);
        }
        attrs.push(RawAttribute {
            typ,
            length: value_len as u16,
            value: cursor[..value_len].to_vec(),
        });
        cursor = &cursor[padded_len..];
    }

    Ok(attrs)
}

/// 8-bit representation of STUN's 2-bit message class.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct MessageClass(u8);

pub const CLASS_REQUEST: MessageClass = MessageClass(0x00);
pub const CLASS_INDICATION: MessageClass = MessageClass(0x01);
pub const CLASS_SUCCESS_RESPONSE: MessageClass = MessageClass(0x02);
pub const CLASS_ERROR_RESPONSE: MessageClass = MessageClass(0x03);

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            CLASS_REQUEST => "request",
            CLASS_INDICATION => "indication",
            CLASS_SUCCESS_RESPONSE => "success response",
            CLASS_ERROR_RESPONSE => "error response",
            _ => "unknown message class",
        };
        write!(f, "{s}")
    }
}

/// 16-bit representation of STUN's 12-bit method field.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub struct Method(u16);

pub const METHOD_BINDING: Method = Method(0x001);

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            METHOD_BINDING => write!(f, "Binding"),
            Method(v) => write!(f, "0x{v:x}"),
        }
    }
}

/// The STUN Message Type field: a method and a class, bit-interleaved on
/// the wire (RFC 5389 Section 6, Figure 3).
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub struct MessageType {
    pub method: Method,
    pub class: MessageClass,
}

pub const BINDING_REQUEST: MessageType = MessageType {
    method: METHOD_BINDING,
    class: CLASS_REQUEST,
};
pub const BINDING_SUCCESS: MessageType = MessageType {
    method: METHOD_BINDING,
    class: CLASS_SUCCESS_RESPONSE,
};
pub const BINDING_ERROR: MessageType = MessageType {
    method: METHOD_BINDING,
    class: CLASS_ERROR_RESPONSE,
};

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.class)
    }
}

// The 14-bit message type field interleaves a 2-bit class between the
// bottom 7 bits and the top 5 bits of the 12-bit method:
//
//   M11 M10 M9 M8 M7 C1 M6 M5 M4 C0 M3 M2 M1 M0
//
// method_low is M0-M3, method_mid is M4-M6, method_high is M7-M11; class_lo
// (C0) sits at bit 4, class_hi (C1) at bit 8.
const METHOD_LOW_MASK: u16 = 0x00f;
const METHOD_MID_MASK: u16 = 0x070;
const METHOD_HIGH_MASK: u16 = 0xf80;
const CLASS_LO_BIT: u16 = 0b01;
const CLASS_HI_BIT: u16 = 0b10;
const CLASS_LO_SHIFT: u16 = 4;
const CLASS_HI_SHIFT: u16 = 7;

impl Setter for MessageType {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.set_type(*self);
        Ok(())
    }
}

impl MessageType {
    pub fn new(method: Method, class: MessageClass) -> Self {
        MessageType { method, class }
    }

    /// Packs `method`/`class` into the 14-bit wire value.
    pub fn value(&self) -> u16 {
        let m = self.method.0;
        let method = (m & METHOD_LOW_MASK)
            + ((m & METHOD_MID_MASK) << 1)
            + ((m & METHOD_HIGH_MASK) << 2);

        let c = self.class.0 as u16;
        let class = ((c & CLASS_LO_BIT) << CLASS_LO_SHIFT) + ((c & CLASS_HI_BIT) << CLASS_HI_SHIFT);

        method + class
    }

    /// Unpacks a 14-bit wire value into `method`/`class`.
    pub fn read_value(&mut self, value: u16) {
        let c0 = (value >> CLASS_LO_SHIFT) & CLASS_LO_BIT;
        let c1 = (value >> CLASS_HI_SHIFT) & CLASS_HI_BIT;
        self.class = MessageClass((c0 + c1) as u8);

        let low = value & METHOD_LOW_MASK;
        let mid = (value >> 1) & METHOD_MID_MASK;
        let high = (value >> 2) & METHOD_HIGH_MASK;
        self.method = Method(low + mid + high);
    }
}

/// A 96-bit identifier correlating a STUN response with the request that
/// caused it.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Default, Debug)]
pub struct TransactionId(pub [u8; TRANSACTION_ID_SIZE]);

impl TransactionId {
    pub fn new() -> Self {
        let mut id = TransactionId([0u8; TRANSACTION_ID_SIZE]);
        rand::thread_rng().fill(&mut id.0);
        id
    }
}

impl Setter for TransactionId {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.transaction_id = *self;
        m.write_transaction_id();
        Ok(())
    }
}
