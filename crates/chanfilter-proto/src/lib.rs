//! # chanfilter-proto
//!
//! Line-level IRC helpers used by the `chanfilter` bouncer filter.
//!
//! The filter never needs a full message model: it looks at one line at a
//! time, picks out a verb and a few positional words, and compares channel
//! names under the network's rules. This crate provides exactly that:
//!
//! - [`LineRef`]: zero-copy split into tags, source, verb and remainder
//! - [`ChannelSyntax`]: channel types, status prefixes and case mapping
//!   negotiated through ISUPPORT
//! - RFC 1459 case-mapping helpers
//!
//! ```rust
//! use chanfilter_proto::{ChannelSyntax, LineRef};
//!
//! let syntax = ChannelSyntax::from_isupport(["CHANTYPES=#", "PREFIX=(ov)@+"]);
//! let line = LineRef::parse(":bot!b@h NOTICE @#ops :heads up").unwrap();
//!
//! let target = syntax.strip_status(line.token(0).unwrap());
//! assert!(syntax.is_channel(target));
//! assert_eq!(target, "#ops");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod error;
pub mod isupport;
pub mod line;
pub mod prefix;
pub mod syntax;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower, CaseMapping};
pub use self::error::LineParseError;
pub use self::isupport::{parse_params, IsupportEntry, PrefixSpec};
pub use self::line::{LineRef, MAX_PARAMS};
pub use self::prefix::PrefixRef;
pub use self::syntax::ChannelSyntax;
