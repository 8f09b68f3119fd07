
use crate::attributes::*;
use crate::error::*;
use crate::message::*;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub(crate) const FAMILY_IPV4: u16 = 0x01;
pub(crate) const FAMILY_IPV6: u16 = 0x02;
pub(crate) const IPV4LEN: usize = 4;
pub(crate) const IPV6LEN: usize = 16;

/// The address-family tag STUN stores alongside every address attribute's
/// port and raw bytes.
#[derive(PartialEq, Eq, Clone, Copy)]
pub(crate) enum Family {
    V4,
    V6,
}

impl Family {
    pub(crate) fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    pub(crate) fn wire_value(self) -> u16 {
        match self {
            Family::V4 => FAMILY_IPV4,
            Family::V6 => FAMILY_IPV6,
        }
    }

    pub(crate) fn from_wire_value(v: u16) -> Result<Self> {
        match v {
            FAMILY_IPV4 => Ok(Family::V4),
            FAMILY_IPV6 => Ok(Family::V6),
            _ => Err(Error::ValueOutOfRange),
        }
    }

    pub(crate) fn addr_len(self) -> usize {
        match self {
            Family::V4 => IPV4LEN,
            Family::V6 => IPV6LEN,
        }
    }
}

/// MAPPED-ADDRESS (RFC 5389 Section 15.1): a server's view of the client's
/// reflexive transport address, carried un-obfuscated. Servers send this
/// only for backwards compatibility with RFC 3489 clients that predate
/// XOR-MAPPED-ADDRESS.
pub struct MappedAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl fmt::Display for MappedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{ip}:{}", self.port),
            IpAddr::V6(ip) => write!(f, "[{ip}]:{}", self.port),
        }
    }
}

impl Default for MappedAddress {
    fn default() -> Self {
        MappedAddress {
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl Setter for MappedAddress {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        self.add_to_as(m, ATTR_MAPPED_ADDRESS)
    }
}

impl Getter for MappedAddress {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        self.get_from_as(m, ATTR_MAPPED_ADDRESS)
    }
}

impl MappedAddress {
    /// Decodes a MAPPED-ADDRESS-shaped value stored under attribute `t`.
    pub fn get_from_as(&mut self, m: &Message, t: AttrType) -> Result<()> {
        let raw = m.get(t)?;
        if raw.len() <= 4 {
            return Err(Error::BadAttributeLength);
        }

        let family = Family::from_wire_value(u16::from_be_bytes([raw[0], raw[1]]))?;
        self.port = u16::from_be_bytes([raw[2], raw[3]]);

        let addr_bytes = &raw[4..];
        let take = addr_bytes.len().min(family.addr_len());
        self.ip = match family {
            Family::V6 => {
                let mut octets = [0u8; IPV6LEN];
                octets[..take].copy_from_slice(&addr_bytes[..take]);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            Family::V4 => {
                let mut octets = [0u8; IPV4LEN];
                octets[..take].copy_from_slice(&addr_bytes[..take]);
                IpAddr::V4(Ipv4Addr::from(octets))
            }
        };

        Ok(())
    }

    /// Encodes this address as a MAPPED-ADDRESS-shaped value under
    /// attribute `t`.
    pub fn add_to_as(&self, m: &mut Message, t: AttrType) -> Result<()> {
        let family = Family::of(&self.ip);

        let mut value = Vec::with_capacity(4 + family.addr_len());
        value.extend_from_slice(&family.wire_value().to_be_bytes());
        value.extend_from_slice(&self.port.to_be_bytes());
        match self.ip {
            IpAddr::V4(ip) => value.extend_from_slice(&ip.octets()),
            IpAddr::V6(ip) => value.extend_from_slice(&ip.octets()),
        }

        m.add(t, &value)
    }
}

/// ALTERNATE-SERVER (RFC 5389 Section 15.11): the address of a server the
/// client should retry its request against.
pub type AlternateServer = MappedAddress;

/// RESPONSE-ORIGIN (RFC 5780 Section 7.3): the address a server actually
/// sent its response from.
pub type ResponseOrigin = MappedAddress;

/// OTHER-ADDRESS (RFC 5780 Section 7.4): a server's other address family /
/// interface, for NAT behavior discovery.
pub type OtherAddress = MappedAddress;
