//! Deferred hides after a client-initiated PART.
//!
//! A scheduled hide is plain data sent back to the filter through a
//! channel once the grace period has elapsed. Each (identifier, channel)
//! key carries the generation of its latest schedule; a JOIN removes the
//! key, so an older timer arriving later no longer matches and is dropped.

use crate::host::SessionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

/// A hide waiting for its grace period to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHide {
    pub identifier: String,
    /// Case-folded channel name.
    pub channel: String,
    /// The session whose PART started the timer.
    pub session: SessionId,
    pub generation: u64,
}

pub struct HideScheduler {
    delay: Duration,
    next_generation: AtomicU64,
    generations: Mutex<HashMap<(String, String), u64>>,
    /// `None` once closed.
    tx: Mutex<Option<mpsc::UnboundedSender<PendingHide>>>,
}

impl HideScheduler {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<PendingHide>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            delay,
            next_generation: AtomicU64::new(0),
            generations: Mutex::new(HashMap::new()),
            tx: Mutex::new(Some(tx)),
        };
        (scheduler, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the grace timer for `(identifier, channel)`, replacing any
    /// earlier one. Returns `false` when the hide must be applied now
    /// instead (zero delay, closed scheduler, or no tokio runtime to run
    /// the timer on).
    pub fn schedule(&self, identifier: &str, channel: &str, session: SessionId) -> bool {
        if self.delay.is_zero() {
            return false;
        }
        let Some(tx) = self.tx.lock().clone() else {
            return false;
        };
        let Ok(handle) = Handle::try_current() else {
            return false;
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.generations
            .lock()
            .insert((identifier.to_string(), channel.to_string()), generation);

        let pending = PendingHide {
            identifier: identifier.to_string(),
            channel: channel.to_string(),
            session,
            generation,
        };
        let delay = self.delay;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the filter was dropped.
            let _ = tx.send(pending);
        });

        debug!(identifier = %identifier, channel = %channel, generation, "Hide scheduled");
        true
    }

    /// Drop the sender. The receiver closes once in-flight timers have fired.
    pub fn close(&self) {
        if self.tx.lock().take().is_some() {
            debug!("Hide scheduler closed");
        }
    }

    /// Invalidate any pending hide for the key. Returns whether one existed.
    pub fn supersede(&self, identifier: &str, channel: &str) -> bool {
        self.generations
            .lock()
            .remove(&(identifier.to_string(), channel.to_string()))
            .is_some()
    }

    pub fn is_pending(&self, identifier: &str, channel: &str) -> bool {
        self.generations
            .lock()
            .contains_key(&(identifier.to_string(), channel.to_string()))
    }

    /// Consume the key if `pending` is still its latest schedule.
    pub fn take_if_current(&self, pending: &PendingHide) -> bool {
        let mut generations = self.generations.lock();
        let key = (pending.identifier.clone(), pending.channel.clone());
        if generations.get(&key) == Some(&pending.generation) {
            generations.remove(&key);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_zero_delay_is_immediate() {
        let (scheduler, _rx) = HideScheduler::new(Duration::ZERO);
        assert!(!scheduler.schedule("phone", "#rust", Uuid::new_v4()));
        assert!(!scheduler.is_pending("phone", "#rust"));
    }

    #[test]
    fn test_no_runtime_is_immediate() {
        let (scheduler, _rx) = HideScheduler::new(Duration::from_secs(5));
        assert!(!scheduler.schedule("phone", "#rust", Uuid::new_v4()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_drains_then_ends() {
        let (scheduler, mut rx) = HideScheduler::new(Duration::from_secs(5));
        assert!(scheduler.schedule("phone", "#rust", Uuid::new_v4()));
        scheduler.close();
        assert!(!scheduler.schedule("phone", "#go", Uuid::new_v4()));

        assert_eq!(rx.recv().await.unwrap().channel, "#rust");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (scheduler, mut rx) = HideScheduler::new(Duration::from_secs(5));
        let session = Uuid::new_v4();
        assert!(scheduler.schedule("phone", "#rust", session));
        assert!(scheduler.is_pending("phone", "#rust"));

        let pending = rx.recv().await.unwrap();
        assert_eq!(pending.identifier, "phone");
        assert_eq!(pending.channel, "#rust");
        assert_eq!(pending.session, session);
        assert!(scheduler.take_if_current(&pending));
        assert!(!scheduler.take_if_current(&pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersede_invalidates() {
        let (scheduler, mut rx) = HideScheduler::new(Duration::from_secs(5));
        scheduler.schedule("phone", "#rust", Uuid::new_v4());
        assert!(scheduler.supersede("phone", "#rust"));
        assert!(!scheduler.supersede("phone", "#rust"));

        let pending = rx.recv().await.unwrap();
        assert!(!scheduler.take_if_current(&pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_earlier_timer() {
        let (scheduler, mut rx) = HideScheduler::new(Duration::from_secs(5));
        let session = Uuid::new_v4();
        scheduler.schedule("phone", "#rust", session);
        scheduler.supersede("phone", "#rust");
        scheduler.schedule("phone", "#rust", session);

        let mut fired = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        fired.sort_by_key(|p| p.generation);
        assert!(!scheduler.take_if_current(&fired[0]));
        assert!(scheduler.take_if_current(&fired[1]));
    }
}
