//! Session -> identifier resolution.
//!
//! A session is identified either by the host (an attribute set during
//! authentication) or by credentials of the form `user@identifier/network`
//! seen before registration. The latter are stripped from the line so the
//! host authenticates the plain user name.

use crate::host::{SessionId, SessionRegistry};
use chanfilter_proto::LineRef;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Owns the transient session bindings learned from credentials.
pub struct IdentityResolver {
    registry: Arc<dyn SessionRegistry>,
    bindings: DashMap<SessionId, String>,
}

impl IdentityResolver {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self {
            registry,
            bindings: DashMap::new(),
        }
    }

    /// The identifier of `session`, or `None` when unidentified.
    pub fn resolve(&self, session: SessionId) -> Option<String> {
        self.registry
            .identifier(session)
            .filter(|id| !id.is_empty())
            .or_else(|| self.bindings.get(&session).map(|id| id.value().clone()))
    }

    /// Every session bound to `identifier`, from the host and from
    /// credential bindings, without duplicates.
    pub fn sessions_for(&self, identifier: &str) -> Vec<SessionId> {
        let mut sessions = self.registry.sessions_for(identifier);
        for binding in self.bindings.iter() {
            if binding.value() == identifier && !sessions.contains(binding.key()) {
                sessions.push(*binding.key());
            }
        }
        sessions
    }

    /// Inspect a pre-registration line for embedded identifier credentials.
    ///
    /// Handles `PASS [user[@identifier][/network]:]password` and
    /// `USER user[@identifier][/network] ...`. On a match the identifier is
    /// bound to `session`, `line` is rewritten without the `@identifier`
    /// part and the identifier is returned.
    pub fn observe_registration(&self, session: SessionId, line: &mut String) -> Option<String> {
        let (identifier, rewritten) = {
            let parsed = LineRef::parse(line).ok()?;
            if parsed.verb_is("PASS") {
                let (colon, field) = match parsed.rest.strip_prefix(':') {
                    Some(field) => (":", field),
                    None => ("", parsed.rest),
                };
                let (identifier, stripped) = take_identifier(field, true)?;
                (identifier, format!("{} {colon}{stripped}", parsed.verb))
            } else if parsed.verb_is("USER") {
                let field = parsed.token(0)?;
                let (identifier, stripped) = take_identifier(field, false)?;
                let rewritten = match parsed.rest_from(1) {
                    Some(tail) => format!("{} {stripped} {tail}", parsed.verb),
                    None => format!("{} {stripped}", parsed.verb),
                };
                (identifier, rewritten)
            } else {
                return None;
            }
        };

        debug!(session = %session, identifier = %identifier, "Bound session from credentials");
        self.bindings.insert(session, identifier.clone());
        *line = rewritten;
        Some(identifier)
    }

    /// Bind `session` to `identifier` directly.
    pub fn bind(&self, session: SessionId, identifier: &str) {
        if !identifier.is_empty() {
            self.bindings.insert(session, identifier.to_string());
        }
    }

    /// Drop the credential binding of a disconnected session.
    pub fn unbind(&self, session: SessionId) -> Option<String> {
        self.bindings.remove(&session).map(|(_, id)| id)
    }
}

/// Split `user@identifier[/network]` (and, with `password`, `...:password`)
/// into the identifier and the field with `@identifier` removed.
fn take_identifier(field: &str, password: bool) -> Option<(String, String)> {
    let (user, rest) = field.split_once('@')?;
    if user.is_empty() {
        return None;
    }

    let end = if password {
        rest.find(['/', ':'])?
    } else {
        rest.find('/').unwrap_or(rest.len())
    };
    let identifier = &rest[..end];
    if identifier.is_empty() {
        return None;
    }

    Some((identifier.to_string(), format!("{user}{}", &rest[end..])))
}
