//! Channel extraction from upstream lines.
//!
//! Every verb maps to an [`Extract`] rule; the rule picks the word after
//! the verb that names the channel. The result is then cleaned (trailing
//! marker and status prefixes stripped) and checked against the network's
//! channel syntax.

use chanfilter_proto::{ChannelSyntax, LineRef};

/// `RPL_NAMREPLY`: `353 <nick> <type> <channel> :<names>`.
const RPL_NAMREPLY: u16 = 353;

/// Verbs whose first argument is the channel (or a nickname target).
const FIRST_ARG_VERBS: &[&str] = &["PRIVMSG", "NOTICE", "JOIN", "PART", "MODE", "KICK", "TOPIC"];

/// The verb of a classified line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb<'a> {
    Numeric(u16),
    Named(&'a str),
}

impl Verb<'_> {
    pub fn is(&self, name: &str) -> bool {
        matches!(self, Verb::Named(v) if v.eq_ignore_ascii_case(name))
    }
}

/// Where the channel sits in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// The `n`-th word after the verb.
    Arg(usize),
    /// The line is not about a channel.
    None,
}

/// Verb plus the channel the line pertains to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub verb: Verb<'a>,
    pub channel: Option<&'a str>,
}

/// Extraction rule for a verb.
pub fn rule(verb: Verb<'_>) -> Extract {
    match verb {
        Verb::Numeric(RPL_NAMREPLY) => Extract::Arg(2),
        Verb::Numeric(_) => Extract::Arg(1),
        Verb::Named(name) if FIRST_ARG_VERBS.iter().any(|v| v.eq_ignore_ascii_case(name)) => {
            Extract::Arg(0)
        }
        Verb::Named(_) => Extract::None,
    }
}

/// Classify one line for the given network syntax.
pub fn classify<'a>(line: &LineRef<'a>, syntax: &ChannelSyntax) -> Classification<'a> {
    let verb = match line.numeric() {
        Some(code) => Verb::Numeric(code),
        None => Verb::Named(line.verb),
    };

    let channel = match rule(verb) {
        Extract::Arg(n) => line.token(n).and_then(|token| channel_token(token, syntax)),
        Extract::None => None,
    };

    Classification { verb, channel }
}

/// For a NOTICE from a services nickname whose body opens with
/// `[#channel]`, the bracketed channel.
pub fn services_notice_channel<'a, S>(
    line: &LineRef<'a>,
    services: &[S],
    syntax: &ChannelSyntax,
) -> Option<&'a str>
where
    S: AsRef<str>,
{
    if !line.verb_is("NOTICE") {
        return None;
    }
    let sender = line.source_nickname()?;
    let casemapping = syntax.casemapping();
    if !services.iter().any(|s| casemapping.eq(s.as_ref(), sender)) {
        return None;
    }

    let word = line.token(1)?;
    let word = word.strip_prefix(':').unwrap_or(word);
    let name = word.strip_prefix('[')?;
    let name = name.strip_suffix(']').unwrap_or(name);
    syntax.is_channel(name).then_some(name)
}

fn channel_token<'a>(token: &'a str, syntax: &ChannelSyntax) -> Option<&'a str> {
    let token = token.strip_prefix(':').unwrap_or(token);
    let token = syntax.strip_status(token);
    syntax.is_channel(token).then_some(token)
}
