//! Broker address parsing.

use std::borrow::Cow;
use std::fmt;

/// Port used when the address string does not carry one.
pub const DEFAULT_PORT: u16 = 1883;

/// A broker endpoint split out of an address string.
///
/// The host borrows the input when the parser did not have to strip
/// anything, and is an owned copy when a port and/or IPv6 brackets were
/// removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub host: Cow<'a, str>,
    pub port: u16,
}

impl<'a> Endpoint<'a> {
    /// Split `uri` into host and port.
    ///
    /// Accepted forms are `host`, `host:port`, `[ipv6]` and `[ipv6]:port`.
    /// The rightmost colon is the port separator, so colons inside a
    /// bracketed IPv6 literal are left alone; a bare literal such as
    /// `fe80::1` needs brackets to carry a port. Missing, malformed or
    /// out-of-range port text falls back to [`DEFAULT_PORT`].
    pub fn parse(uri: &'a str) -> Self {
        if let Some(rest) = uri.strip_prefix('[') {
            if let Some(end) = rest.find(']') {
                let port = match rest[end + 1..].strip_prefix(':') {
                    Some(text) => text.parse().unwrap_or(DEFAULT_PORT),
                    None => DEFAULT_PORT,
                };
                return Endpoint {
                    host: Cow::Owned(rest[..end].to_owned()),
                    port,
                };
            }
            // Unmatched '[': the whole string is the host.
            return Endpoint {
                host: Cow::Borrowed(uri),
                port: DEFAULT_PORT,
            };
        }

        match uri.rfind(':') {
            Some(at) => Endpoint {
                host: Cow::Owned(uri[..at].to_owned()),
                port: uri[at + 1..].parse().unwrap_or(DEFAULT_PORT),
            },
            None => Endpoint {
                host: Cow::Borrowed(uri),
                port: DEFAULT_PORT,
            },
        }
    }

    /// Host with any port and brackets removed. For TLS this is the name
    /// presented for SNI.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Detach the host from the input string's lifetime.
    pub fn into_owned(self) -> Endpoint<'static> {
        Endpoint {
            host: Cow::Owned(self.host.into_owned()),
            port: self.port,
        }
    }
}

/// Renders the form [`Endpoint::parse`] reads back: `host:port`, with the
/// host bracketed when it contains a colon.
impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
