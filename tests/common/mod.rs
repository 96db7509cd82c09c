//! Integration test common infrastructure.
//!
//! A fake bouncer host: a session registry that records raw writes and an
//! upstream network with channels and member lists, wired to a
//! [`ChannelFilter`] backed by an in-memory store.

#![allow(dead_code)]

use chanfilter::config::FilterConfig;
use chanfilter::db::{KvStore, MemoryKv};
use chanfilter::{
    ChannelFilter, ChannelStatus, Network, PendingHide, SessionId, SessionRegistry, Verdict,
    VisibilityStore,
};
use chanfilter_proto::irc_to_lower;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct FakeSession {
    pub id: SessionId,
    pub identifier: Option<String>,
    pub nick: String,
    pub open: bool,
    pub written: Vec<String>,
}

/// Sessions in connection order.
#[derive(Default)]
pub struct FakeRegistry {
    sessions: Mutex<Vec<FakeSession>>,
}

impl FakeRegistry {
    pub fn add(&self, identifier: Option<&str>, nick: &str) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.lock().push(FakeSession {
            id,
            identifier: identifier.map(str::to_string),
            nick: nick.to_string(),
            open: true,
            written: Vec::new(),
        });
        id
    }

    pub fn close(&self, session: SessionId) {
        if let Some(s) = self.sessions.lock().iter_mut().find(|s| s.id == session) {
            s.open = false;
        }
    }

    pub fn all(&self) -> Vec<SessionId> {
        self.sessions.lock().iter().map(|s| s.id).collect()
    }

    /// Drain the lines written to `session` through `write_raw`.
    pub fn take_written(&self, session: SessionId) -> Vec<String> {
        self.sessions
            .lock()
            .iter_mut()
            .find(|s| s.id == session)
            .map(|s| std::mem::take(&mut s.written))
            .unwrap_or_default()
    }
}

impl SessionRegistry for FakeRegistry {
    fn identifier(&self, session: SessionId) -> Option<String> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.id == session)
            .and_then(|s| s.identifier.clone())
    }

    fn sessions_for(&self, identifier: &str) -> Vec<SessionId> {
        self.sessions
            .lock()
            .iter()
            .filter(|s| s.identifier.as_deref() == Some(identifier))
            .map(|s| s.id)
            .collect()
    }

    fn is_open(&self, session: SessionId) -> bool {
        self.sessions
            .lock()
            .iter()
            .any(|s| s.id == session && s.open)
    }

    fn nick(&self, session: SessionId) -> Option<String> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.id == session)
            .map(|s| s.nick.clone())
    }

    fn nick_mask(&self, session: SessionId) -> Option<String> {
        self.nick(session).map(|nick| format!("{nick}!user@bouncer"))
    }

    fn write_raw(&self, session: SessionId, line: &str) {
        if let Some(s) = self.sessions.lock().iter_mut().find(|s| s.id == session) {
            s.written.push(line.to_string());
        }
    }
}

pub struct FakeChannel {
    pub name: String,
    pub status: ChannelStatus,
    pub members: BTreeSet<String>,
}

#[derive(Default)]
pub struct FakeNetwork {
    isupport: Mutex<Vec<String>>,
    channels: Mutex<BTreeMap<String, FakeChannel>>,
    attached: Mutex<Vec<(SessionId, String)>>,
}

impl FakeNetwork {
    pub fn set_isupport(&self, tokens: &[&str]) {
        *self.isupport.lock() = tokens.iter().map(|t| t.to_string()).collect();
    }

    /// Put the upstream connection on `name` with the given members.
    pub fn join(&self, name: &str, members: &[&str]) {
        self.channels.lock().insert(
            irc_to_lower(name),
            FakeChannel {
                name: name.to_string(),
                status: ChannelStatus {
                    joined: true,
                    ..Default::default()
                },
                members: members.iter().map(|m| irc_to_lower(m)).collect(),
            },
        );
    }

    pub fn leave(&self, name: &str) {
        self.channels.lock().remove(&irc_to_lower(name));
    }

    pub fn attached(&self) -> Vec<(SessionId, String)> {
        self.attached.lock().clone()
    }
}

impl Network for FakeNetwork {
    fn isupport(&self) -> Vec<String> {
        self.isupport.lock().clone()
    }

    fn channel(&self, name: &str) -> Option<ChannelStatus> {
        self.channels.lock().get(&irc_to_lower(name)).map(|c| c.status)
    }

    fn joined_channels(&self) -> Vec<String> {
        self.channels
            .lock()
            .values()
            .filter(|c| c.status.joined)
            .map(|c| c.name.clone())
            .collect()
    }

    fn has_member(&self, channel: &str, nick: &str) -> bool {
        self.channels
            .lock()
            .get(&irc_to_lower(channel))
            .is_some_and(|c| c.members.contains(&irc_to_lower(nick)))
    }

    fn attach(&self, session: SessionId, channel: &str) {
        self.attached.lock().push((session, channel.to_string()));
    }
}

/// A filter wired to fake host collaborators.
pub struct Harness {
    pub registry: Arc<FakeRegistry>,
    pub network: Arc<FakeNetwork>,
    pub store: Arc<VisibilityStore>,
    pub filter: Arc<ChannelFilter>,
    pub pending: mpsc::UnboundedReceiver<PendingHide>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FilterConfig::default())
    }

    pub fn with_config(config: FilterConfig) -> Self {
        Self::with_kv(config, Arc::new(MemoryKv::new()))
    }

    pub fn with_kv(config: FilterConfig, kv: Arc<dyn KvStore>) -> Self {
        let registry = Arc::new(FakeRegistry::default());
        let network = Arc::new(FakeNetwork::default());
        let store = Arc::new(VisibilityStore::load(kv).expect("load store"));
        let (filter, pending) =
            ChannelFilter::new(config, store.clone(), registry.clone(), network.clone());
        Self {
            registry,
            network,
            store,
            filter: Arc::new(filter),
            pending,
        }
    }

    /// Connect and log in a session sharing the upstream nickname `me`.
    pub fn connect(&self, identifier: Option<&str>) -> SessionId {
        let session = self.registry.add(identifier, "me");
        self.filter.on_login(session);
        session
    }

    /// Offer an upstream line to one session. Returns whether it is delivered.
    pub fn send_to(&self, session: SessionId, line: &str) -> bool {
        let mut line = line.to_string();
        self.filter.on_send_to_client(session, &mut line) == Verdict::Continue
    }

    /// Fan an upstream line out to every session, in connection order.
    /// Returns the sessions it was delivered to.
    pub fn broadcast(&self, line: &str) -> Vec<SessionId> {
        self.registry
            .all()
            .into_iter()
            .filter(|s| self.registry.is_open(*s))
            .filter(|s| self.send_to(*s, line))
            .collect()
    }

    /// Offer a downstream line. Returns the verdict and the possibly rewritten line.
    pub fn client_line(&self, session: SessionId, line: &str) -> (Verdict, String) {
        let mut line = line.to_string();
        let verdict = self.filter.on_client_line(session, &mut line);
        (verdict, line)
    }

    pub fn visible(&self, identifier: &str, channel: &str) -> bool {
        self.store.is_visible(identifier, channel)
    }

    pub fn hide(&self, identifier: &str, channel: &str) {
        self.store
            .set_visible(identifier, channel, false)
            .expect("hide channel");
    }
}
