
use crate::addr::*;
use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fn safe_xor_bytes(dst: &mut [u8], a: &[u8], b: &[u8]) -> usize {
    let n = dst.len().min(a.len()).min(b.len());
    for ((d, x), y) in dst.iter_mut().zip(a).zip(b).take(n) {
        *d = x ^ y;
    }
    n
}

/// XORs `a` against `b` into `dst`, which must be at least as long as the
/// shorter of the two. Returns how many bytes were written.
pub fn xor_bytes(dst: &mut [u8], a: &[u8], b: &[u8]) -> usize {
    safe_xor_bytes(dst, a, b)
}

/// The 16-byte pad XOR-MAPPED-ADDRESS obfuscates its address bytes with:
/// the magic cookie followed by the transaction ID. IPv4 addresses only
/// ever use the cookie half of it.
fn xor_pad(transaction_id: &TransactionId) -> [u8; 4 + TRANSACTION_ID_SIZE] {
    let mut pad = [0u8; 4 + TRANSACTION_ID_SIZE];
    pad[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    pad[4..].copy_from_slice(&transaction_id.0);
    pad
}

/// XOR-MAPPED-ADDRESS (RFC 5389 Section 15.2): like MAPPED-ADDRESS, but
/// with the port and address XOR'd against the magic cookie and
/// transaction ID so that NAT devices rewriting addresses inside the
/// packet body can't accidentally mangle this one too.
pub struct XorMappedAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for XorMappedAddress {
    fn default() -> Self {
        XorMappedAddress {
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl fmt::Display for XorMappedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{ip}:{}", self.port),
            IpAddr::V6(ip) => write!(f, "[{ip}]:{}", self.port),
        }
    }
}

impl Setter for XorMappedAddress {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        self.add_to_as(m, ATTR_XORMAPPED_ADDRESS)
    }
}

impl Getter for XorMappedAddress {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        self.get_from_as(m, ATTR_XORMAPPED_ADDRESS)
    }
}

impl XorMappedAddress {
    /// Encodes this address, XOR-obfuscated, as attribute `t`.
    pub fn add_to_as(&self, m: &mut Message, t: AttrType) -> Result<()> {
        let family = Family::of(&self.ip);
        let pad = xor_pad(&m.transaction_id);
        let xor_port = self.port ^ (MAGIC_COOKIE >> 16) as u16;

        let mut value = Vec::with_capacity(4 + family.addr_len());
        value.extend_from_slice(&family.wire_value().to_be_bytes());
        value.extend_from_slice(&xor_port.to_be_bytes());

        let mut xored_addr = vec![0u8; family.addr_len()];
        match self.ip {
            IpAddr::V4(ip) => xor_bytes(&mut xored_addr, &ip.octets(), &pad),
            IpAddr::V6(ip) => xor_bytes(&mut xored_addr, &ip.octets(), &pad),
        };
        value.extend_from_slice(&xored_addr);

        m.add(t, &value)
    }

    /// Decodes an XOR-obfuscated address value stored under attribute `t`.
    pub fn get_from_as(&mut self, m: &Message, t: AttrType) -> Result<()> {
        let raw = m.get(t)?;
        if raw.len() <= 4 {
            return Err(Error::BadAttributeLength);
        }

        let family = Family::from_wire_value(u16::from_be_bytes([raw[0], raw[1]]))?;
        check_overflow(t, raw[4..].len(), family.addr_len())?;

        self.port = u16::from_be_bytes([raw[2], raw[3]]) ^ (MAGIC_COOKIE >> 16) as u16;
        let pad = xor_pad(&m.transaction_id);

        self.ip = match family {
            Family::V6 => {
                let mut octets = [0u8; IPV6LEN];
                xor_bytes(&mut octets, &raw[4..], &pad);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            Family::V4 => {
                let mut octets = [0u8; IPV4LEN];
                xor_bytes(&mut octets, &raw[4..], &pad);
                IpAddr::V4(Ipv4Addr::from(octets))
            }
        };

        Ok(())
    }
}
