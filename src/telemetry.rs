//! Telemetry utilities for line timing and span construction.

use std::time::Instant;

/// Guard for timing one filter decision.
///
/// Records latency when dropped.
pub struct LineTimer {
    direction: &'static str,
    start: Instant,
}

impl LineTimer {
    pub fn new(direction: &'static str) -> Self {
        Self {
            direction,
            start: Instant::now(),
        }
    }
}

impl Drop for LineTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_line(self.direction, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use std::fmt::Display;
    use tracing::{Span, debug_span, info_span};

    /// A line from a downstream session.
    pub fn inbound(session: &impl Display, identifier: &str) -> Span {
        debug_span!("inbound", session = %session, identifier = %identifier)
    }

    /// A line on its way to a downstream session.
    pub fn outbound(session: &impl Display, identifier: &str) -> Span {
        debug_span!("outbound", session = %session, identifier = %identifier)
    }

    /// A deferred hide being applied.
    pub fn pending_hide(identifier: &str, channel: &str) -> Span {
        info_span!("pending_hide", identifier = %identifier, channel = %channel)
    }

    /// An administrative command.
    pub fn admin(command: &str) -> Span {
        info_span!("admin", command = %command)
    }
}
