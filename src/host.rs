//! Interfaces consumed from the host bouncer runtime.
//!
//! The filter never owns connections or channels. It sees the bouncer
//! through two narrow traits and reports its decisions as a [`Verdict`].

use chanfilter_proto::ChannelSyntax;
use uuid::Uuid;

/// Stable handle for one downstream session.
pub type SessionId = Uuid;

/// Outcome of an interception point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Let the line continue through normal processing.
    Continue,
    /// Drop the line for this destination only; other filters still run.
    HaltCore,
    /// Drop the line and skip every remaining filter.
    Halt,
}

impl Verdict {
    /// Whether the line is dropped.
    pub fn is_suppressed(self) -> bool {
        !matches!(self, Verdict::Continue)
    }
}

/// Upstream-side state of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStatus {
    /// The shared connection is currently on the channel.
    pub joined: bool,
    /// The bouncer has detached the channel from all clients.
    pub detached: bool,
    /// The bouncer will not rejoin the channel.
    pub disabled: bool,
}

/// Enumeration of, and raw access to, downstream sessions.
pub trait SessionRegistry: Send + Sync {
    /// Identifier attached to the session by the host's authentication step.
    fn identifier(&self, session: SessionId) -> Option<String>;

    /// Every session currently bound to `identifier`, snapshotted now.
    fn sessions_for(&self, identifier: &str) -> Vec<SessionId>;

    /// Whether the session is still connected and usable.
    fn is_open(&self, session: SessionId) -> bool;

    /// The session's current nickname.
    fn nick(&self, session: SessionId) -> Option<String>;

    /// The session's full `nick!user@host`.
    fn nick_mask(&self, session: SessionId) -> Option<String>;

    /// Write a line straight to the session, bypassing the outbound filter.
    fn write_raw(&self, session: SessionId, line: &str);
}

/// The shared upstream connection.
pub trait Network: Send + Sync {
    /// Raw ISUPPORT tokens from every 005 reply seen so far.
    fn isupport(&self) -> Vec<String>;

    /// Upstream status of a channel, `None` if the bouncer does not know it.
    fn channel(&self, name: &str) -> Option<ChannelStatus>;

    /// Names of every channel the upstream connection is currently on.
    fn joined_channels(&self) -> Vec<String>;

    /// Whether `nick` is in the member list of `channel`.
    fn has_member(&self, channel: &str, nick: &str) -> bool;

    /// Add the session to the channel's local membership view and replay
    /// the join burst to it, without a network round trip.
    fn attach(&self, session: SessionId, channel: &str);

    /// Channel-name syntax derived from the negotiated ISUPPORT tokens.
    fn syntax(&self) -> ChannelSyntax {
        let tokens = self.isupport();
        ChannelSyntax::from_isupport(tokens.iter().map(String::as_str))
    }

    /// Whether the upstream connection is on `name` right now.
    fn is_joined(&self, name: &str) -> bool {
        self.channel(name).is_some_and(|c| c.joined && !c.disabled)
    }
}
