//! Upstream -> downstream suppression.

use super::ChannelFilter;
use super::classify::{classify, services_notice_channel};
use crate::host::{SessionId, Verdict};
use chanfilter_proto::LineRef;
use tracing::{debug, info};

impl ChannelFilter {
    pub(super) fn filter_outbound(&self, session: SessionId, identifier: &str, line: &str) -> Verdict {
        let parsed = match LineRef::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "Unparseable line delivered");
                return Verdict::Continue;
            }
        };
        let syntax = self.network.syntax();
        let sender = parsed.source_nickname();
        let own_nick = self.registry.nick(session);
        let is_self = match (sender, own_nick.as_deref()) {
            (Some(sender), Some(own)) => syntax.casemapping().eq(sender, own),
            _ => false,
        };

        if self.config.filter_quit_nick
            && !is_self
            && (parsed.verb_is("QUIT") || parsed.verb_is("NICK"))
            && let Some(sender) = sender
            && self.only_in_hidden(identifier, sender)
        {
            debug!(nick = %sender, verb = %parsed.verb, "Suppressed for hidden-only user");
            return Verdict::HaltCore;
        }

        if let Some(channel) = services_notice_channel(&parsed, &self.config.services, &syntax)
            && !self.store.is_visible(identifier, channel)
        {
            debug!(channel = %channel, "Suppressed services notice");
            return Verdict::HaltCore;
        }

        let class = classify(&parsed, &syntax);
        let Some(channel) = class.channel else {
            return Verdict::Continue;
        };

        if !self.store.is_visible(identifier, channel) {
            return Verdict::HaltCore;
        }

        if is_self && class.verb.is("PART") && self.registry.is_open(session) {
            self.acknowledge_part(session, identifier, channel, parsed.untagged());
        }
        Verdict::Continue
    }

    /// The upstream really left a channel this identifier still saw.
    fn acknowledge_part(&self, session: SessionId, identifier: &str, channel: &str, untagged: &str) {
        if !matches!(self.hide(identifier, channel), Ok(true)) {
            return;
        }
        info!(channel = %channel, "Upstream parted channel, now hidden");

        // Siblings evaluated after this point see the channel hidden. They
        // may not have negotiated message tags.
        for s in self.open_sessions(identifier) {
            if s != session {
                self.registry.write_raw(s, untagged);
            }
        }
    }

    /// Whether `nick` shares at least one upstream channel with us and
    /// every such channel is hidden for `identifier`.
    fn only_in_hidden(&self, identifier: &str, nick: &str) -> bool {
        let mut shared = false;
        for channel in self.network.joined_channels() {
            if !self.network.has_member(&channel, nick) {
                continue;
            }
            if self.store.is_visible(identifier, &channel) {
                return false;
            }
            shared = true;
        }
        shared
    }
}
