
use std::fmt;

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

fn require_binding_request(m: &Message, attr: &'static str) -> Result<()> {
    if m.typ != BINDING_REQUEST {
        return Err(Error::ContextViolation(attr));
    }
    Ok(())
}

/// PriorityAttr represents the PRIORITY attribute used by ICE connectivity
/// checks to carry a candidate pair's priority.
///
/// RFC 8445 Section 7.1.1
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct PriorityAttr(pub u32);

pub(crate) const PRIORITY_SIZE: usize = 4; // 32 bit

impl Setter for PriorityAttr {
    /// Adds PRIORITY to message. Valid only on a Binding request.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        require_binding_request(m, "PRIORITY is only valid on a Binding request")?;
        m.add(ATTR_PRIORITY, &self.0.to_be_bytes())
    }
}

impl Getter for PriorityAttr {
    /// Decodes PRIORITY from message.
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_PRIORITY)?;
        check_size(ATTR_PRIORITY, v.len(), PRIORITY_SIZE)?;
        self.0 = u32::from_be_bytes([v[0], v[1], v[2], v[3]]);
        Ok(())
    }
}

/// UseCandidateAttr represents the USE-CANDIDATE attribute: an empty-payload
/// flag, its mere presence nominating the candidate pair.
///
/// RFC 8445 Section 7.1.2
#[derive(Default)]
pub struct UseCandidateAttr;

impl Setter for UseCandidateAttr {
    /// Adds USE-CANDIDATE attribute to message. Valid only on a Binding request.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        require_binding_request(m, "USE-CANDIDATE is only valid on a Binding request")?;
        m.add(ATTR_USE_CANDIDATE, &[])
    }
}

impl UseCandidateAttr {
    pub const fn new() -> Self {
        Self
    }

    /// Returns true if USE-CANDIDATE attribute is set.
    pub fn is_set(m: &Message) -> bool {
        m.contains(ATTR_USE_CANDIDATE)
    }
}

/// Common helper for ICE-{CONTROLLED,CONTROLLING}: the so-called tiebreaker
/// number used to resolve a role conflict between two agents.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct TieBreaker(pub u64);

pub(crate) const TIE_BREAKER_SIZE: usize = 8; // 64 bit

impl TieBreaker {
    /// Adds the tiebreaker value to m as t attribute.
    pub fn add_to_as(self, m: &mut Message, t: AttrType) -> Result<()> {
        require_binding_request(m, "ICE-CONTROLLED/ICE-CONTROLLING are only valid on a Binding request")?;
        m.add(t, &self.0.to_be_bytes())
    }

    /// Decodes the tiebreaker value in message getting it as for t type.
    pub fn get_from_as(&mut self, m: &Message, t: AttrType) -> Result<()> {
        let v = m.get(t)?;
        check_size(t, v.len(), TIE_BREAKER_SIZE)?;
        self.0 = u64::from_be_bytes([v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]]);
        Ok(())
    }
}

/// AttrControlled represents ICE-CONTROLLED attribute.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct AttrControlled(pub u64);

impl Setter for AttrControlled {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        TieBreaker(self.0).add_to_as(m, ATTR_ICE_CONTROLLED)
    }
}

impl Getter for AttrControlled {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let mut t = TieBreaker::default();
        t.get_from_as(m, ATTR_ICE_CONTROLLED)?;
        self.0 = t.0;
        Ok(())
    }
}

/// AttrControlling represents ICE-CONTROLLING attribute.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct AttrControlling(pub u64);

impl Setter for AttrControlling {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        TieBreaker(self.0).add_to_as(m, ATTR_ICE_CONTROLLING)
    }
}

impl Getter for AttrControlling {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let mut t = TieBreaker::default();
        t.get_from_as(m, ATTR_ICE_CONTROLLING)?;
        self.0 = t.0;
        Ok(())
    }
}

/// Role is the ICE agent's role in a connectivity check, controlling which
/// of ICE-CONTROLLED/ICE-CONTROLLING is carried.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Role {
    Controlling,
    Controlled,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Controlling => "controlling",
            Self::Controlled => "controlled",
        };
        write!(f, "{s}")
    }
}

/// AttrControl wraps ICE-{CONTROLLED,CONTROLLING}, picking the attribute to
/// write/read based on Role.
#[derive(Debug, Clone, Copy)]
pub struct AttrControl {
    pub role: Role,
    pub tie_breaker: TieBreaker,
}

impl Setter for AttrControl {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        if self.role == Role::Controlling {
            self.tie_breaker.add_to_as(m, ATTR_ICE_CONTROLLING)
        } else {
            self.tie_breaker.add_to_as(m, ATTR_ICE_CONTROLLED)
        }
    }
}

impl Getter for AttrControl {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        if m.contains(ATTR_ICE_CONTROLLING) {
            self.role = Role::Controlling;
            return self.tie_breaker.get_from_as(m, ATTR_ICE_CONTROLLING);
        }
        if m.contains(ATTR_ICE_CONTROLLED) {
            self.role = Role::Controlled;
            return self.tie_breaker.get_from_as(m, ATTR_ICE_CONTROLLED);
        }
        Err(Error::AttributeNotFound)
    }
}
