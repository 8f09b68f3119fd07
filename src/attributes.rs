
use crate::error::*;
use crate::message::*;

use std::fmt;

/// Attribute type numbers below this boundary are comprehension-required:
/// an agent that doesn't recognize one MUST NOT process the message it's
/// found in. Numbers at or above it are comprehension-optional and may be
/// safely skipped.
const COMPREHENSION_REQUIRED_CEILING: u16 = 0x7FFF;

/// The ordered list of attributes attached to a [`Message`].
#[derive(Default, PartialEq, Eq, Debug, Clone)]
pub struct Attributes(pub Vec<RawAttribute>);

impl Attributes {
    /// Looks up the first attribute of type `t`. The bool is `false` (and
    /// the attribute default/empty) when none is present.
    pub fn get(&self, t: AttrType) -> (RawAttribute, bool) {
        match self.0.iter().find(|a| a.typ == t) {
            Some(a) => (a.clone(), true),
            None => (RawAttribute::default(), false),
        }
    }

    /// True if an attribute of type `t` is present.
    pub fn contains(&self, t: AttrType) -> bool {
        self.0.iter().any(|a| a.typ == t)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawAttribute> {
        self.0.iter()
    }
}

/// A STUN attribute's 16-bit type number.
#[derive(PartialEq, Debug, Eq, Default, Copy, Clone, Hash)]
pub struct AttrType(pub u16);

/// Attribute type numbers this crate has a name for, used by `AttrType`'s
/// `Display` impl. Anything else prints as `0x____`.
const KNOWN_NAMES: &[(AttrType, &str)] = &[
    (ATTR_MAPPED_ADDRESS, "MAPPED-ADDRESS"),
    (ATTR_USERNAME, "USERNAME"),
    (ATTR_ERROR_CODE, "ERROR-CODE"),
    (ATTR_MESSAGE_INTEGRITY, "MESSAGE-INTEGRITY"),
    (ATTR_UNKNOWN_ATTRIBUTES, "UNKNOWN-ATTRIBUTES"),
    (ATTR_REALM, "REALM"),
    (ATTR_NONCE, "NONCE"),
    (ATTR_XORMAPPED_ADDRESS, "XOR-MAPPED-ADDRESS"),
    (ATTR_SOFTWARE, "SOFTWARE"),
    (ATTR_ALTERNATE_SERVER, "ALTERNATE-SERVER"),
    (ATTR_FINGERPRINT, "FINGERPRINT"),
    (ATTR_PRIORITY, "PRIORITY"),
    (ATTR_USE_CANDIDATE, "USE-CANDIDATE"),
    (ATTR_ICE_CONTROLLED, "ICE-CONTROLLED"),
    (ATTR_ICE_CONTROLLING, "ICE-CONTROLLING"),
    (ATTR_CHANNEL_NUMBER, "CHANNEL-NUMBER"),
    (ATTR_LIFETIME, "LIFETIME"),
    (ATTR_XOR_PEER_ADDRESS, "XOR-PEER-ADDRESS"),
    (ATTR_DATA, "DATA"),
    (ATTR_XOR_RELAYED_ADDRESS, "XOR-RELAYED-ADDRESS"),
    (ATTR_EVEN_PORT, "EVEN-PORT"),
    (ATTR_REQUESTED_TRANSPORT, "REQUESTED-TRANSPORT"),
    (ATTR_DONT_FRAGMENT, "DONT-FRAGMENT"),
    (ATTR_RESERVATION_TOKEN, "RESERVATION-TOKEN"),
    (ATTR_CONNECTION_ID, "CONNECTION-ID"),
    (ATTR_REQUESTED_ADDRESS_FAMILY, "REQUESTED-ADDRESS-FAMILY"),
    (ATTR_MESSAGE_INTEGRITY_SHA256, "MESSAGE-INTEGRITY-SHA256"),
    (ATTR_PASSWORD_ALGORITHM, "PASSWORD-ALGORITHM"),
    (ATTR_USER_HASH, "USERHASH"),
    (ATTR_PASSWORD_ALGORITHMS, "PASSWORD-ALGORITHMS"),
    (ATTR_ALTERNATE_DOMAIN, "ALTERNATE-DOMAIN"),
];

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KNOWN_NAMES.iter().find(|(t, _)| *t == *self) {
            Some((_, name)) => write!(f, "{name}"),
            None => write!(f, "0x{:x}", self.0),
        }
    }
}

impl AttrType {
    /// True if this type is in the comprehension-required range
    /// (0x0000-0x7FFF): an agent must understand it or reject the message.
    pub fn required(&self) -> bool {
        self.0 <= COMPREHENSION_REQUIRED_CEILING
    }

    /// True if this type is in the comprehension-optional range
    /// (0x8000-0xFFFF): agents may silently skip it if unrecognized.
    pub fn optional(&self) -> bool {
        !self.required()
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

// Comprehension-required attributes (0x0000-0x7FFF).
pub const ATTR_MAPPED_ADDRESS: AttrType = AttrType(0x0001);
pub const ATTR_USERNAME: AttrType = AttrType(0x0006);
pub const ATTR_MESSAGE_INTEGRITY: AttrType = AttrType(0x0008);
pub const ATTR_ERROR_CODE: AttrType = AttrType(0x0009);
pub const ATTR_UNKNOWN_ATTRIBUTES: AttrType = AttrType(0x000A);
pub const ATTR_REALM: AttrType = AttrType(0x0014);
pub const ATTR_NONCE: AttrType = AttrType(0x0015);
pub const ATTR_XORMAPPED_ADDRESS: AttrType = AttrType(0x0020);

// Comprehension-optional attributes (0x8000-0xFFFF).
pub const ATTR_SOFTWARE: AttrType = AttrType(0x8022);
pub const ATTR_ALTERNATE_SERVER: AttrType = AttrType(0x8023);
pub const ATTR_FINGERPRINT: AttrType = AttrType(0x8028);

// RFC 5245 / RFC 8445 ICE.
pub const ATTR_PRIORITY: AttrType = AttrType(0x0024);
pub const ATTR_USE_CANDIDATE: AttrType = AttrType(0x0025);
pub const ATTR_ICE_CONTROLLED: AttrType = AttrType(0x8029);
pub const ATTR_ICE_CONTROLLING: AttrType = AttrType(0x802A);

// RFC 5766 TURN.
pub const ATTR_CHANNEL_NUMBER: AttrType = AttrType(0x000C);
pub const ATTR_LIFETIME: AttrType = AttrType(0x000D);
pub const ATTR_XOR_PEER_ADDRESS: AttrType = AttrType(0x0012);
pub const ATTR_DATA: AttrType = AttrType(0x0013);
pub const ATTR_XOR_RELAYED_ADDRESS: AttrType = AttrType(0x0016);
pub const ATTR_EVEN_PORT: AttrType = AttrType(0x0018);
pub const ATTR_REQUESTED_TRANSPORT: AttrType = AttrType(0x0019);
pub const ATTR_DONT_FRAGMENT: AttrType = AttrType(0x001A);
pub const ATTR_RESERVATION_TOKEN: AttrType = AttrType(0x0022);

// RFC 5780 NAT Behavior Discovery.
pub const ATTR_CHANGE_REQUEST: AttrType = AttrType(0x0003);
pub const ATTR_PADDING: AttrType = AttrType(0x0026);
pub const ATTR_RESPONSE_PORT: AttrType = AttrType(0x0027);
pub const ATTR_CACHE_TIMEOUT: AttrType = AttrType(0x8027);
pub const ATTR_RESPONSE_ORIGIN: AttrType = AttrType(0x802b);
pub const ATTR_OTHER_ADDRESS: AttrType = AttrType(0x802C);

// RFC 3489 attributes, removed by RFC 5389 but still seen from older peers.
pub const ATTR_SOURCE_ADDRESS: AttrType = AttrType(0x0004);
pub const ATTR_CHANGED_ADDRESS: AttrType = AttrType(0x0005);

// RFC 6062 TURN TCP allocations.
pub const ATTR_CONNECTION_ID: AttrType = AttrType(0x002a);

// RFC 6156 TURN IPv6.
pub const ATTR_REQUESTED_ADDRESS_FAMILY: AttrType = AttrType(0x0017);

// "An Origin Attribute for the STUN Protocol".
pub const ATTR_ORIGIN: AttrType = AttrType(0x802F);

// RFC 8489 STUN.
pub const ATTR_MESSAGE_INTEGRITY_SHA256: AttrType = AttrType(0x001C);
pub const ATTR_PASSWORD_ALGORITHM: AttrType = AttrType(0x001D);
pub const ATTR_USER_HASH: AttrType = AttrType(0x001E);
pub const ATTR_PASSWORD_ALGORITHMS: AttrType = AttrType(0x8002);
pub const ATTR_ALTERNATE_DOMAIN: AttrType = AttrType(0x8003);

/// A Type-Length-Value attribute as it appears on the wire. `length` is
/// only meaningful after a decode; encoding derives it from `value.len()`.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub typ: AttrType,
    pub length: u16,
    pub value: Vec<u8>,
}

impl fmt::Display for RawAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.typ, self.value)
    }
}

impl Setter for RawAttribute {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(self.typ, &self.value)
    }
}

pub(crate) const PADDING: usize = 4;

/// STUN attribute values are padded up to the next 4-byte boundary; the
/// padding bytes themselves carry no meaning.
///
/// https://tools.ietf.org/html/rfc5389#section-15
pub(crate) fn nearest_padded_value_length(len: usize) -> usize {
    (len + PADDING - 1) / PADDING * PADDING
}

/// Some RFC3489bis drafts used 0x8020 for what RFC 5389 finalized as
/// XOR-MAPPED-ADDRESS (0x0020); translate it so messages from software
/// built against those drafts still decode. See pion/stun#21.
pub(crate) fn compat_attr_type(val: u16) -> AttrType {
    if val == 0x8020 {
        ATTR_XORMAPPED_ADDRESS
    } else {
        AttrType(val)
    }
}
