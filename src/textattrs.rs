
use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

use std::fmt;

/// Maximum encoded byte length for each text attribute this crate knows
/// how to carry (RFC 5389 Sections 15.3, 15.7, 15.8, 15.10).
const MAX_LENGTHS: &[(AttrType, usize)] = &[
    (ATTR_USERNAME, 513),
    (ATTR_REALM, 763),
    (ATTR_SOFTWARE, 763),
    (ATTR_NONCE, 763),
];

fn max_len_for(attr: AttrType) -> Result<usize> {
    MAX_LENGTHS
        .iter()
        .find(|(t, _)| *t == attr)
        .map(|(_, max)| *max)
        .ok_or_else(|| Error::Other(format!("Unsupported AttrType {attr}")))
}

/// USERNAME (RFC 5389 Section 15.3).
pub type Username = TextAttribute;

/// REALM (RFC 5389 Section 15.7).
pub type Realm = TextAttribute;

/// NONCE (RFC 5389 Section 15.8).
pub type Nonce = TextAttribute;

/// SOFTWARE (RFC 5389 Section 15.10).
pub type Software = TextAttribute;

/// A UTF-8 text value attached under one of the four STUN text attribute
/// types, each bounded to its own maximum encoded length.
#[derive(Clone, Default)]
pub struct TextAttribute {
    pub attr: AttrType,
    pub text: String,
}

impl fmt::Display for TextAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Setter for TextAttribute {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let encoded = self.text.as_bytes();
        check_overflow(self.attr, encoded.len(), max_len_for(self.attr)?)?;
        m.add(self.attr, encoded)
    }
}

impl Getter for TextAttribute {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        *self = TextAttribute::get_from_as(m, self.attr)?;
        Ok(())
    }
}

impl TextAttribute {
    pub fn new(attr: AttrType, text: String) -> Self {
        TextAttribute { attr, text }
    }

    /// Reads the attribute of type `attr` out of `m` as text.
    pub fn get_from_as(m: &Message, attr: AttrType) -> Result<Self> {
        max_len_for(attr)?;
        let text = String::from_utf8(m.get(attr)?)?;
        Ok(TextAttribute { attr, text })
    }
}
