//! Downstream JOIN/PART handling.
//!
//! A PART of a channel the upstream is on only hides it for the
//! identifier; the bouncer stays joined. A JOIN of such a channel restores
//! it locally without a round trip.

use super::ChannelFilter;
use crate::host::{SessionId, Verdict};
use chanfilter_proto::{LineRef, irc_to_lower};
use tracing::debug;

impl ChannelFilter {
    pub(super) fn intercept_inbound(
        &self,
        session: SessionId,
        identifier: &str,
        line: &mut String,
    ) -> Verdict {
        let rewritten = {
            let Ok(parsed) = LineRef::parse(line) else {
                return Verdict::Continue;
            };
            let params = parsed.params();
            let Some(targets) = params.first().copied() else {
                return Verdict::Continue;
            };

            if parsed.verb_is("JOIN") {
                return if targets == "0" {
                    self.part_all(session, identifier)
                } else {
                    self.join(identifier, targets)
                };
            }
            if !parsed.verb_is("PART") {
                return Verdict::Continue;
            }

            let reason = params.get(1).copied();
            let mut genuine = Vec::new();
            let mut total = 0;
            for channel in targets.split(',').filter(|c| !c.is_empty()) {
                total += 1;
                if !self.part(session, identifier, channel, reason) {
                    genuine.push(channel);
                }
            }

            if genuine.is_empty() {
                return Verdict::Halt;
            }
            if genuine.len() == total {
                return Verdict::Continue;
            }

            let mut out = String::new();
            if let Some(tags) = parsed.tags {
                out.push('@');
                out.push_str(tags);
                out.push(' ');
            }
            out.push_str(parsed.verb);
            out.push(' ');
            out.push_str(&genuine.join(","));
            if let Some(reason) = reason {
                out.push_str(" :");
                out.push_str(reason);
            }
            out
        };

        debug!(line = %rewritten, "Forwarding remaining PART targets");
        *line = rewritten;
        Verdict::Continue
    }

    /// `JOIN a,b,...`: show every target, attach the ones upstream is on.
    fn join(&self, identifier: &str, targets: &str) -> Verdict {
        let sessions = self.open_sessions(identifier);
        let mut all_attached = true;

        for channel in targets.split(',').filter(|c| !c.is_empty()) {
            self.scheduler.supersede(identifier, &irc_to_lower(channel));
            let shown = self.set_visible(identifier, channel, true).is_ok();

            if shown && self.network.is_joined(channel) {
                for &s in &sessions {
                    self.network.attach(s, channel);
                }
                debug!(channel = %channel, sessions = sessions.len(), "Restored hidden channel locally");
            } else {
                all_attached = false;
            }
        }

        if all_attached {
            Verdict::Halt
        } else {
            Verdict::Continue
        }
    }

    /// `JOIN 0`: hide every channel the identifier currently sees.
    ///
    /// Channels inside their grace period were already parted by the
    /// client, so they are hidden without another PART.
    fn part_all(&self, session: SessionId, identifier: &str) -> Verdict {
        for channel in self.network.joined_channels() {
            if !self.store.is_visible(identifier, &channel) {
                continue;
            }
            let already_parted = self.scheduler.supersede(identifier, &irc_to_lower(&channel));
            if self.hide(identifier, &channel).is_ok() && !already_parted {
                self.broadcast_part(session, identifier, &channel, None);
            }
        }
        Verdict::Halt
    }

    /// Hide one PART target locally. Returns `false` when the PART must go
    /// upstream instead, including when the hide could not be stored.
    fn part(
        &self,
        session: SessionId,
        identifier: &str,
        channel: &str,
        reason: Option<&str>,
    ) -> bool {
        let folded = irc_to_lower(channel);
        let visible = self.store.is_visible(identifier, channel)
            && !self.scheduler.is_pending(identifier, &folded);
        if !visible || !self.network.is_joined(channel) {
            return false;
        }

        if !self.scheduler.schedule(identifier, &folded, session)
            && self.hide(identifier, channel).is_err()
        {
            return false;
        }
        self.broadcast_part(session, identifier, channel, reason);
        true
    }

    /// Write a self-PART to every open session of `identifier`, bypassing
    /// the outbound filter.
    fn broadcast_part(
        &self,
        origin: SessionId,
        identifier: &str,
        channel: &str,
        reason: Option<&str>,
    ) {
        let fallback = self.registry.nick_mask(origin);
        for s in self.open_sessions(identifier) {
            let Some(mask) = self.registry.nick_mask(s).or_else(|| fallback.clone()) else {
                continue;
            };
            let line = match reason {
                Some(reason) => format!(":{mask} PART {channel} :{reason}"),
                None => format!(":{mask} PART {channel}"),
            };
            self.registry.write_raw(s, &line);
        }
    }
}
