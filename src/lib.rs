//! chanfilter - per-identity channel visibility for multi-client bouncers.
//!
//! Several downstream sessions share one upstream IRC connection. Each
//! session resolves to an *identifier*; each identifier may hide channels
//! the upstream stays joined to. [`ChannelFilter`] intercepts lines in both
//! directions and keeps every identifier's view consistent:
//!
//! - a client PART hides the channel for that identifier only
//! - a client JOIN of a hidden channel restores it without a round trip
//! - upstream traffic for hidden channels is suppressed per destination
//!
//! The host bouncer supplies sessions and upstream state through the
//! [`host`] traits and persistence through a [`db::KvStore`].

pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod host;
pub mod metrics;
pub mod state;
pub mod telemetry;

pub use admin::{Admin, ChannelVisibility, ClientSummary};
pub use config::Config;
pub use error::AdminError;
pub use filter::{ChannelFilter, PendingHide};
pub use host::{ChannelStatus, Network, SessionId, SessionRegistry, Verdict};
pub use state::{HiddenSet, IdentityResolver, VisibilityStore};
