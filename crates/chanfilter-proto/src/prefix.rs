//! Borrowed message source prefix.
//!
//! A source is either a server name or a `nick!user@host` mask. Parsing is
//! lenient: components are split on the first `!` and `@` without
//! validation.

/// A borrowed view of a message source (`nick!user@host` or `server.name`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixRef<'a> {
    /// Nickname or server name.
    pub name: &'a str,
    /// Username, if present.
    pub user: Option<&'a str>,
    /// Hostname, if present.
    pub host: Option<&'a str>,
    /// The raw prefix without the leading `:`.
    pub raw: &'a str,
}

impl<'a> PrefixRef<'a> {
    /// Split a raw prefix (without its leading `:`) into components.
    pub fn parse(raw: &'a str) -> Self {
        let (rest, host) = match raw.split_once('@') {
            Some((rest, host)) => (rest, Some(host)),
            None => (raw, None),
        };
        let (name, user) = match rest.split_once('!') {
            Some((name, user)) => (name, Some(user)),
            None => (rest, None),
        };
        Self {
            name,
            user,
            host,
            raw,
        }
    }

    /// True when the source looks like a server rather than a user.
    ///
    /// A bare name containing a dot with no user or host part is a server.
    pub fn is_server(&self) -> bool {
        self.user.is_none() && self.host.is_none() && self.name.contains('.')
    }

    /// The nickname, or `None` for server sources.
    pub fn nickname(&self) -> Option<&'a str> {
        if self.is_server() || self.name.is_empty() {
            None
        } else {
            Some(self.name)
        }
    }
}
