//! The channel filter.
//!
//! [`ChannelFilter`] sits between the shared upstream connection and the
//! downstream sessions. The host calls one hook per event:
//!
//! - [`on_unregistered_line`](ChannelFilter::on_unregistered_line): credential lines before login
//! - [`on_login`](ChannelFilter::on_login) / [`on_client_disconnect`](ChannelFilter::on_client_disconnect)
//! - [`on_client_line`](ChannelFilter::on_client_line): downstream -> upstream
//! - [`on_send_to_client`](ChannelFilter::on_send_to_client): upstream -> one downstream
//!
//! Deferred hides come back through the receiver returned by
//! [`ChannelFilter::new`], which the host drains with
//! [`run_pending`](ChannelFilter::run_pending).

pub mod classify;
mod inbound;
mod outbound;
pub mod scheduler;

pub use classify::{Classification, Extract, Verb, classify, services_notice_channel};
pub use scheduler::{HideScheduler, PendingHide};

use crate::config::FilterConfig;
use crate::db::StoreError;
use crate::host::{Network, SessionId, SessionRegistry, Verdict};
use crate::state::{IdentityResolver, VisibilityStore};
use crate::telemetry::{LineTimer, spans};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct ChannelFilter {
    config: FilterConfig,
    store: Arc<VisibilityStore>,
    identity: IdentityResolver,
    registry: Arc<dyn SessionRegistry>,
    network: Arc<dyn Network>,
    scheduler: HideScheduler,
}

impl ChannelFilter {
    pub fn new(
        config: FilterConfig,
        store: Arc<VisibilityStore>,
        registry: Arc<dyn SessionRegistry>,
        network: Arc<dyn Network>,
    ) -> (Self, mpsc::UnboundedReceiver<PendingHide>) {
        let (scheduler, rx) = HideScheduler::new(config.hide_delay());
        let filter = Self {
            config,
            store,
            identity: IdentityResolver::new(registry.clone()),
            registry,
            network,
            scheduler,
        };
        (filter, rx)
    }

    pub fn store(&self) -> &Arc<VisibilityStore> {
        &self.store
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn scheduler(&self) -> &HideScheduler {
        &self.scheduler
    }

    /// Number of open sessions bound to `identifier`.
    pub fn active_sessions(&self, identifier: &str) -> usize {
        self.open_sessions(identifier).len()
    }

    /// A line from a session that has not completed registration.
    pub fn on_unregistered_line(&self, session: SessionId, line: &mut String) -> Verdict {
        self.identity.observe_registration(session, line);
        Verdict::Continue
    }

    /// The session finished logging in.
    pub fn on_login(&self, session: SessionId) {
        if let Some(identifier) = self.identity.resolve(session) {
            self.register(&identifier);
        }
    }

    /// The session went away. Its identifier stays known.
    pub fn on_client_disconnect(&self, session: SessionId) {
        if let Some(identifier) = self.identity.resolve(session) {
            self.register(&identifier);
        }
        self.identity.unbind(session);
    }

    /// A line from a downstream session, before it reaches upstream.
    pub fn on_client_line(&self, session: SessionId, line: &mut String) -> Verdict {
        let Some(identifier) = self.identity.resolve(session) else {
            return Verdict::Continue;
        };
        let _span = spans::inbound(&session, &identifier).entered();
        let _timer = LineTimer::new("inbound");

        let verdict = self.intercept_inbound(session, &identifier, line);
        if verdict.is_suppressed() {
            crate::metrics::record_suppressed("inbound");
        }
        verdict
    }

    /// A line about to be written to one downstream session.
    pub fn on_send_to_client(&self, session: SessionId, line: &mut String) -> Verdict {
        let Some(identifier) = self.identity.resolve(session) else {
            return Verdict::Continue;
        };
        let _span = spans::outbound(&session, &identifier).entered();
        let _timer = LineTimer::new("outbound");

        let verdict = self.filter_outbound(session, &identifier, line);
        if verdict.is_suppressed() {
            crate::metrics::record_suppressed("outbound");
        }
        verdict
    }

    /// Apply deferred hides as their timers fire. Returns once
    /// [`shutdown`](Self::shutdown) has been called and every timer already
    /// running has delivered.
    pub async fn run_pending(&self, mut rx: mpsc::UnboundedReceiver<PendingHide>) {
        while let Some(pending) = rx.recv().await {
            self.apply_pending(pending);
        }
        debug!("Pending hide queue closed");
    }

    /// Stop accepting deferred hides. Later PARTs hide immediately.
    pub fn shutdown(&self) {
        self.scheduler.close();
    }

    /// Apply one deferred hide. Returns whether the channel was hidden.
    pub fn apply_pending(&self, pending: PendingHide) -> bool {
        let _span = spans::pending_hide(&pending.identifier, &pending.channel).entered();

        if !self.scheduler.take_if_current(&pending) {
            debug!(generation = pending.generation, "Pending hide superseded");
            crate::metrics::record_pending_hide("superseded");
            return false;
        }
        if !self.registry.is_open(pending.session) {
            debug!(session = %pending.session, "Pending hide dropped, session closed");
            crate::metrics::record_pending_hide("dropped");
            return false;
        }

        match self
            .store
            .set_visible(&pending.identifier, &pending.channel, false)
        {
            Ok(_) => {
                crate::metrics::record_pending_hide("applied");
                true
            }
            Err(e) => {
                warn!(error = %e, "Pending hide not persisted");
                crate::metrics::record_pending_hide("failed");
                false
            }
        }
    }

    fn register(&self, identifier: &str) {
        match self.store.add_identifier(identifier) {
            Ok(true) => info!(identifier = %identifier, "New client identifier"),
            Ok(false) => {}
            Err(e) => warn!(identifier = %identifier, error = %e, "Failed to register identifier"),
        }
    }

    fn hide(&self, identifier: &str, channel: &str) -> Result<bool, StoreError> {
        self.set_visible(identifier, channel, false)
    }

    /// The store's `set_visible`, with failures logged. On `Err` nothing
    /// changed, so callers must not act as if it had.
    fn set_visible(
        &self,
        identifier: &str,
        channel: &str,
        visible: bool,
    ) -> Result<bool, StoreError> {
        self.store
            .set_visible(identifier, channel, visible)
            .inspect_err(|e| {
                warn!(identifier = %identifier, channel = %channel, visible, error = %e, "Visibility not persisted");
            })
    }

    /// Open sessions bound to `identifier`, looked up now.
    fn open_sessions(&self, identifier: &str) -> Vec<SessionId> {
        self.identity
            .sessions_for(identifier)
            .into_iter()
            .filter(|s| self.registry.is_open(*s))
            .collect()
    }
}
