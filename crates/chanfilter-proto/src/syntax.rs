//! Channel-name syntax negotiated through ISUPPORT.
//!
//! Whether a token names a channel depends on the network: `CHANTYPES`
//! lists the channel prefixes, `STATUSMSG` (or the symbol half of `PREFIX`)
//! lists the membership markers that may precede a channel name in
//! messages like `PRIVMSG @#chan`, and `CASEMAPPING` defines equality.

use crate::casemap::CaseMapping;
use crate::isupport::{parse_params, PrefixSpec};

const DEFAULT_CHANTYPES: &str = "#&";
const DEFAULT_PREFIX_SYMBOLS: &str = "@+";

/// Channel-name rules for one upstream network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSyntax {
    chantypes: String,
    prefix_symbols: String,
    statusmsg: Option<String>,
    casemapping: CaseMapping,
}

impl Default for ChannelSyntax {
    fn default() -> Self {
        Self {
            chantypes: DEFAULT_CHANTYPES.to_string(),
            prefix_symbols: DEFAULT_PREFIX_SYMBOLS.to_string(),
            statusmsg: None,
            casemapping: CaseMapping::default(),
        }
    }
}

impl ChannelSyntax {
    /// Build from raw ISUPPORT tokens (any number of 005 lines concatenated).
    pub fn from_isupport<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut syntax = Self::default();
        syntax.apply_isupport(tokens);
        syntax
    }

    /// Fold further ISUPPORT tokens into this syntax. Later tokens win.
    pub fn apply_isupport<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for entry in parse_params(tokens) {
            match (entry.key.to_ascii_uppercase().as_str(), entry.negated) {
                ("CHANTYPES", false) => {
                    self.chantypes = entry.value.unwrap_or_default().to_string();
                }
                ("CHANTYPES", true) => self.chantypes = DEFAULT_CHANTYPES.to_string(),
                ("PREFIX", false) => {
                    self.prefix_symbols = entry
                        .value
                        .and_then(PrefixSpec::parse)
                        .map(|spec| spec.prefixes.to_string())
                        .unwrap_or_default();
                }
                ("PREFIX", true) => self.prefix_symbols = DEFAULT_PREFIX_SYMBOLS.to_string(),
                ("STATUSMSG", false) => {
                    self.statusmsg = Some(entry.value.unwrap_or_default().to_string());
                }
                ("STATUSMSG", true) => self.statusmsg = None,
                ("CASEMAPPING", false) => {
                    if let Some(mapping) = entry.value.and_then(CaseMapping::from_token) {
                        self.casemapping = mapping;
                    }
                }
                ("CASEMAPPING", true) => self.casemapping = CaseMapping::default(),
                _ => {}
            }
        }
    }

    /// Channel-type characters, e.g. `#&`.
    pub fn chantypes(&self) -> &str {
        &self.chantypes
    }

    /// Status-prefix characters that may precede a channel name.
    pub fn status_prefixes(&self) -> &str {
        self.statusmsg.as_deref().unwrap_or(&self.prefix_symbols)
    }

    /// The network case mapping.
    pub fn casemapping(&self) -> CaseMapping {
        self.casemapping
    }

    /// True if `token` is a syntactically valid channel name.
    pub fn is_channel(&self, token: &str) -> bool {
        let mut chars = token.chars();
        match chars.next() {
            Some(first) if self.chantypes.contains(first) => {}
            _ => return false,
        }
        chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }

    /// Strip leading status-prefix characters (`@#chan` -> `#chan`).
    ///
    /// A character that is both a status prefix and a channel type is only
    /// removed when another status or channel-type character follows it, so
    /// `&local` is kept while `@&local` becomes `&local`.
    pub fn strip_status<'a>(&self, token: &'a str) -> &'a str {
        let status = self.status_prefixes();
        let mut rest = token;
        while let Some(c) = rest.chars().next() {
            if !status.contains(c) {
                break;
            }
            let after = &rest[c.len_utf8()..];
            if self.chantypes.contains(c)
                && !after.starts_with(|n: char| status.contains(n) || self.chantypes.contains(n))
            {
                break;
            }
            rest = after;
        }
        rest
    }

    /// Fold a name with the network case mapping.
    pub fn to_lower(&self, name: &str) -> String {
        self.casemapping.to_lower(name)
    }
}
