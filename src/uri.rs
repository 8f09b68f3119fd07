#[cfg(test)]
mod uri_test;

use std::fmt;
use std::str::FromStr;

use crate::error::*;

/// `stun:`/`stuns:` URI scheme names, RFC 7064 Section 3.2.
pub const SCHEME: &str = "stun";
pub const SCHEME_SECURE: &str = "stuns";

/// A parsed `stun:`/`stuns:` URI (RFC 7064): scheme, host, and an optional
/// port. Hosts are stored without the `[...]` brackets RFC 7064 wraps
/// around IPv6 literals; `Display` re-adds them when needed.
#[derive(PartialEq, Eq, Debug)]
pub struct Uri {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bracketed_host = self.host.contains("::");
        match (bracketed_host, self.port) {
            (true, Some(port)) => write!(f, "{}:[{}]:{port}", self.scheme, self.host),
            (true, None) => write!(f, "{}:[{}]", self.scheme, self.host),
            (false, Some(port)) => write!(f, "{}:{}:{port}", self.scheme, self.host),
            (false, None) => write!(f, "{}:{}", self.scheme, self.host),
        }
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        Uri::parse_uri(raw)
    }
}

impl Uri {
    /// Splits `scheme:rest` into its two halves. RFC 7064 STUN URIs have no
    /// authority marker (no `//`), which `url::Url` insists on, so we smuggle
    /// one in before handing the string off.
    fn to_generic_url(raw: &str) -> Result<String> {
        if raw.contains("//") {
            // A real `//` means this isn't a bare RFC 7064 URI to begin with.
            return Err(Error::InvalidUrl);
        }

        let colon = raw.find(':').ok_or(Error::SchemeType)?;
        let mut buf = String::with_capacity(raw.len() + 2);
        buf.push_str(&raw[..colon]);
        buf.push_str("://");
        buf.push_str(&raw[colon + 1..]);
        Ok(buf)
    }

    fn validated_scheme(url: &url::Url) -> Result<String> {
        let scheme = url.scheme();
        if scheme == SCHEME || scheme == SCHEME_SECURE {
            Ok(scheme.to_owned())
        } else {
            Err(Error::SchemeType)
        }
    }

    fn bare_host(url: &url::Url) -> Result<String> {
        let host = url.host_str().ok_or(Error::Host)?;
        Ok(host.trim().trim_matches(|c| c == '[' || c == ']').to_owned())
    }

    /// Parses a `stun:host[:port]` or `stuns:host[:port]` URI.
    pub fn parse_uri(raw: &str) -> Result<Self> {
        let url = url::Url::parse(&Self::to_generic_url(raw)?)?;

        Ok(Uri {
            scheme: Self::validated_scheme(&url)?,
            host: Self::bare_host(&url)?,
            port: url.port(),
        })
    }
}
