//! Zero-copy line view.
//!
//! [`LineRef`] splits a single protocol line into its tag segment, source
//! prefix, verb and the raw remainder without allocating. Filtering code
//! mostly wants positional words out of the remainder, so the remainder is
//! kept raw and tokenized on demand.
//!
//! ```
//! use chanfilter_proto::LineRef;
//!
//! let line = LineRef::parse("@time=x :nick!u@h PRIVMSG #chan :hello there").unwrap();
//! assert_eq!(line.verb, "PRIVMSG");
//! assert_eq!(line.source_nickname(), Some("nick"));
//! assert_eq!(line.token(0), Some("#chan"));
//! assert_eq!(line.token(1), Some(":hello"));
//! assert_eq!(line.params().as_slice(), &["#chan", "hello there"]);
//! ```

use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::LineParseError;
use crate::prefix::PrefixRef;

/// Maximum number of parameters kept by [`LineRef::params`] (RFC 2812).
pub const MAX_PARAMS: usize = 15;

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_till(|c: char| c == ' '))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c: char| c != ' '))(input)
}

/// Verb is 1*letter or 3digit.
fn parse_verb(input: &str) -> IResult<&str, &str> {
    let (rest, verb) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let is_all_letters = verb.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = verb.len() == 3 && verb.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, verb))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

fn parse_line(input: &str) -> IResult<&str, (Option<&str>, Option<&str>, &str)> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (rest, verb) = parse_verb(input)?;
    Ok((rest, (tags, prefix, verb)))
}

/// A borrowed, tokenizable view of one protocol line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineRef<'a> {
    /// Raw tag segment without the leading `@`.
    pub tags: Option<&'a str>,
    /// Parsed source prefix.
    pub prefix: Option<PrefixRef<'a>>,
    /// The verb exactly as sent (case preserved).
    pub verb: &'a str,
    /// Everything after the verb, with leading spaces removed.
    pub rest: &'a str,
    /// The line without its terminator.
    pub raw: &'a str,
}

impl<'a> LineRef<'a> {
    /// Parse a raw line. Trailing `\r`/`\n` are ignored.
    pub fn parse(s: &'a str) -> Result<Self, LineParseError> {
        let raw = s.trim_end_matches(['\r', '\n']);
        if raw.trim().is_empty() {
            return Err(LineParseError::Empty);
        }

        let (rest, (tags, prefix, verb)) = match parse_line(raw) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(LineParseError::InvalidVerb {
                    position: raw.len() - e.input.len(),
                });
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(LineParseError::InvalidVerb { position: raw.len() });
            }
        };

        Ok(Self {
            tags,
            prefix: prefix.map(PrefixRef::parse),
            verb,
            rest: rest.trim_start_matches(' '),
            raw,
        })
    }

    /// Case-insensitive verb comparison.
    #[inline]
    pub fn verb_is(&self, name: &str) -> bool {
        self.verb.eq_ignore_ascii_case(name)
    }

    /// The numeric reply code, if the verb is three digits.
    pub fn numeric(&self) -> Option<u16> {
        if self.verb.len() == 3 && self.verb.bytes().all(|b| b.is_ascii_digit()) {
            self.verb.parse().ok()
        } else {
            None
        }
    }

    /// Source nickname, `None` for server sources or lines without a prefix.
    pub fn source_nickname(&self) -> Option<&'a str> {
        self.prefix.as_ref().and_then(PrefixRef::nickname)
    }

    /// The line with its `@tags` segment removed.
    pub fn untagged(&self) -> &'a str {
        match self.tags {
            Some(tags) => self.raw[1 + tags.len()..].trim_start_matches(' '),
            None => self.raw,
        }
    }

    /// The `n`-th space-delimited word after the verb.
    ///
    /// Words of the trailing parameter are counted like any other word and
    /// keep their leading `:`, mirroring a plain whitespace tokenizer.
    pub fn token(&self, n: usize) -> Option<&'a str> {
        self.rest.split(' ').filter(|t| !t.is_empty()).nth(n)
    }

    /// Everything from the `n`-th word onwards.
    pub fn rest_from(&self, n: usize) -> Option<&'a str> {
        let mut rest = self.rest;
        for _ in 0..n {
            rest = rest.trim_start_matches(' ');
            let end = rest.find(' ')?;
            rest = &rest[end..];
        }
        let rest = rest.trim_start_matches(' ');
        (!rest.is_empty()).then_some(rest)
    }

    /// RFC-style parameter list; the trailing parameter keeps its spaces.
    pub fn params(&self) -> SmallVec<[&'a str; MAX_PARAMS]> {
        let mut params: SmallVec<[&'a str; MAX_PARAMS]> = SmallVec::new();
        let mut rest = self.rest;

        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() || params.len() >= MAX_PARAMS {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing);
                break;
            }
            let end = rest.find(' ').unwrap_or(rest.len());
            params.push(&rest[..end]);
            rest = &rest[end..];
        }

        params
    }
}
