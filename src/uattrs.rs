
use std::fmt;

use crate::attributes::*;
use crate::error::*;
use crate::message::*;

/// UNKNOWN-ATTRIBUTES (RFC 5389 Section 15.9): carried on a 420 response,
/// listing the comprehension-required attribute types the responder
/// couldn't handle.
pub struct UnknownAttributes(pub Vec<AttrType>);

impl fmt::Display for UnknownAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<nil>");
        }
        let names: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

const ATTR_TYPE_SIZE: usize = 2;

impl Setter for UnknownAttributes {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        if m.typ.class != CLASS_ERROR_RESPONSE {
            return Err(Error::ContextViolation(
                "UNKNOWN-ATTRIBUTES is only valid in an error-response message",
            ));
        }
        let v: Vec<u8> = self
            .0
            .iter()
            .flat_map(|t| t.value().to_be_bytes())
            .collect();
        m.add(ATTR_UNKNOWN_ATTRIBUTES, &v)
    }
}

impl Getter for UnknownAttributes {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_UNKNOWN_ATTRIBUTES)?;
        if v.len() % ATTR_TYPE_SIZE != 0 {
            return Err(Error::BadUnknownAttrsSize);
        }
        self.0 = v
            .chunks_exact(ATTR_TYPE_SIZE)
            .map(|pair| AttrType(u16::from_be_bytes([pair[0], pair[1]])))
            .collect();
        Ok(())
    }
}
