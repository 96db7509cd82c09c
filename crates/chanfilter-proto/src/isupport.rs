//! ISUPPORT (RPL_ISUPPORT / 005) token parsing.
//!
//! Only the handful of tokens that shape channel names are interpreted
//! here; everything else is carried as a raw [`IsupportEntry`].

/// A single ISUPPORT token: `KEY`, `KEY=VALUE` or a negated `-KEY`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    /// The token key (e.g. `CHANTYPES`).
    pub key: &'a str,
    /// The value after `=`, if any.
    pub value: Option<&'a str>,
    /// True for `-KEY`, which withdraws a previously advertised token.
    pub negated: bool,
}

/// Parse ISUPPORT tokens, stopping at the trailing `:are supported…` text.
pub fn parse_params<'a, I>(params: I) -> Vec<IsupportEntry<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries = Vec::new();
    for p in params {
        if p.starts_with(':') {
            break;
        }
        if p.is_empty() {
            continue;
        }
        let (negated, p) = match p.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, p),
        };
        let (key, value) = match p.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (p, None),
        };
        entries.push(IsupportEntry {
            key,
            value,
            negated,
        });
    }
    entries
}

/// Parsed `PREFIX` token, e.g. `(qaohv)~&@%+`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixSpec<'a> {
    /// Mode characters (`qaohv`).
    pub modes: &'a str,
    /// Prefix symbols in the same order (`~&@%+`).
    pub prefixes: &'a str,
}

impl<'a> PrefixSpec<'a> {
    /// Parse a `PREFIX` value. `(ov)@+` and a bare `@+` are both accepted.
    pub fn parse(s: &'a str) -> Option<Self> {
        match s.strip_prefix('(') {
            Some(inner) => {
                let (modes, prefixes) = inner.split_once(')')?;
                (!modes.is_empty() && !prefixes.is_empty()).then_some(Self { modes, prefixes })
            }
            None if !s.is_empty() => Some(Self {
                modes: "",
                prefixes: s,
            }),
            None => None,
        }
    }
}
