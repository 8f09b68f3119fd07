
use crc::{Crc, CRC_32_ISO_HDLC};

use crate::attributes::ATTR_FINGERPRINT;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

/// FINGERPRINT (RFC 5389 Section 15.5): a CRC-32 checksum of the message
/// covering every byte before it, used to cheaply tell STUN traffic apart
/// from other protocols sharing the same port.
pub struct FingerprintAttr;

/// Shorthand instance: `FINGERPRINT.add_to(&mut m)`.
pub const FINGERPRINT: FingerprintAttr = FingerprintAttr {};

/// XOR mask applied to the raw CRC-32 so it can't be confused with a
/// checksum some other protocol multiplexed onto the same socket computed.
const XOR_MASK: u32 = 0x5354_554e;
pub const FINGERPRINT_SIZE: usize = 4;

const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the FINGERPRINT value for `bytes`: CRC-32/ISO-HDLC, XOR'd with
/// [`XOR_MASK`].
pub fn fingerprint_value(bytes: &[u8]) -> u32 {
    CRC.checksum(bytes) ^ XOR_MASK
}

impl Setter for FingerprintAttr {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        if m.typ == MessageType::default() {
            return Err(Error::TypeNotSet);
        }

        // The checksum must cover a header whose length field already
        // accounts for this attribute, so we bump it, hash, then restore it
        // before the real append (which bumps it again, for good).
        let length_without_fingerprint = m.length;
        m.length += (FINGERPRINT_SIZE + ATTRIBUTE_HEADER_SIZE) as u32;
        m.write_length();
        let value = fingerprint_value(&m.raw);
        m.length = length_without_fingerprint;
        m.write_length();

        m.add(ATTR_FINGERPRINT, &value.to_be_bytes())
    }
}

impl FingerprintAttr {
    /// Verifies the FINGERPRINT attribute already present in `m`.
    pub fn check(&self, m: &Message) -> Result<()> {
        let raw_value = m.get(ATTR_FINGERPRINT)?;
        check_size(ATTR_FINGERPRINT, raw_value.len(), FINGERPRINT_SIZE)?;
        let found = u32::from_be_bytes(raw_value[..4].try_into().unwrap());

        let covered_len = m.raw.len() - (FINGERPRINT_SIZE + ATTRIBUTE_HEADER_SIZE);
        let expected = fingerprint_value(&m.raw[..covered_len]);
        check_fingerprint(found, expected)
    }
}
