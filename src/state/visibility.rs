//! Per-identifier hidden channel sets.
//!
//! The cache is a `DashMap` in front of a [`KvStore`]. All mutations of one
//! identifier happen under that identifier's entry lock and are
//! write-through: the store is written first and the cache only changes
//! once the write has succeeded.

use crate::db::{KvStore, StoreError};
use chanfilter_proto::irc_to_lower;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Case-folded names of the channels hidden from one identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenSet(BTreeSet<String>);

impl HiddenSet {
    /// Decode the persisted comma-joined form.
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match Self::parse_lossy(value) {
            (set, rejected) if rejected.is_empty() => Ok(set),
            (_, rejected) => Err(StoreError::Serialization(format!(
                "invalid channel name {:?}",
                rejected[0]
            ))),
        }
    }

    /// Decode what can be decoded, returning the rejected tokens alongside.
    pub fn parse_lossy(value: &str) -> (Self, Vec<&str>) {
        let mut set = BTreeSet::new();
        let mut rejected = Vec::new();
        for name in value.split(',').filter(|n| !n.is_empty()) {
            if name.chars().any(|c| c == ' ' || c.is_control()) {
                rejected.push(name);
            } else {
                set.insert(irc_to_lower(name));
            }
        }
        (Self(set), rejected)
    }

    /// Whether `channel` is hidden. The name is folded before lookup.
    pub fn contains(&self, channel: &str) -> bool {
        self.0.contains(&irc_to_lower(channel))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hidden names in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Insert (hide) or remove (show) a folded name. Returns whether the set changed.
    fn apply(&mut self, folded: &str, visible: bool) -> bool {
        if visible {
            self.0.remove(folded)
        } else {
            self.0.insert(folded.to_string())
        }
    }
}

impl fmt::Display for HiddenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Durable identifier -> [`HiddenSet`] mapping.
pub struct VisibilityStore {
    kv: Arc<dyn KvStore>,
    cache: DashMap<String, HiddenSet>,
}

impl VisibilityStore {
    /// Build the store from everything already persisted in `kv`.
    ///
    /// Undecodable channel tokens are dropped from the cached set; the
    /// identifier and the rest of its channels are kept. The stored value
    /// is rewritten on the identifier's next mutation.
    pub fn load(kv: Arc<dyn KvStore>) -> Result<Self, StoreError> {
        let cache = DashMap::new();
        for identifier in kv.keys()? {
            let Some(value) = kv.get(&identifier)? else {
                continue;
            };
            let (set, rejected) = HiddenSet::parse_lossy(&value);
            if !rejected.is_empty() {
                warn!(identifier = %identifier, rejected = ?rejected, "Dropping undecodable hidden channels");
            }
            cache.insert(identifier, set);
        }
        info!(identifiers = cache.len(), "Visibility store loaded");
        Ok(Self { kv, cache })
    }

    /// Hidden channels of `identifier`; empty for unknown identifiers.
    pub fn list_hidden(&self, identifier: &str) -> HiddenSet {
        self.cache
            .get(identifier)
            .map(|set| set.value().clone())
            .unwrap_or_default()
    }

    /// Whether `channel` is visible to `identifier`.
    ///
    /// Unidentified (empty) and unknown identifiers see everything.
    pub fn is_visible(&self, identifier: &str, channel: &str) -> bool {
        if identifier.is_empty() {
            return true;
        }
        self.cache
            .get(identifier)
            .is_none_or(|set| !set.contains(channel))
    }

    /// Show or hide `channel` for `identifier`, creating the identifier if
    /// needed. Returns whether the hidden set changed.
    pub fn set_visible(
        &self,
        identifier: &str,
        channel: &str,
        visible: bool,
    ) -> Result<bool, StoreError> {
        if identifier.is_empty() || channel.is_empty() {
            return Ok(false);
        }
        let folded = irc_to_lower(channel);

        let changed = match self.cache.entry(identifier.to_string()) {
            Entry::Occupied(mut occupied) => {
                let mut next = occupied.get().clone();
                if !next.apply(&folded, visible) {
                    return Ok(false);
                }
                self.persist(identifier, &next)?;
                *occupied.get_mut() = next;
                true
            }
            Entry::Vacant(vacant) => {
                let mut next = HiddenSet::default();
                let changed = next.apply(&folded, visible);
                self.persist(identifier, &next)?;
                vacant.insert(next);
                changed
            }
        };

        if changed {
            let kind = if visible { "show" } else { "hide" };
            crate::metrics::record_visibility_change(kind);
            debug!(identifier = %identifier, channel = %folded, visible, "Visibility changed");
        }
        Ok(changed)
    }

    /// Register `identifier`. Returns `true` if it was not known before.
    pub fn add_identifier(&self, identifier: &str) -> Result<bool, StoreError> {
        if identifier.is_empty() {
            return Ok(false);
        }
        match self.cache.entry(identifier.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                let set = HiddenSet::default();
                self.persist(identifier, &set)?;
                vacant.insert(set);
                info!(identifier = %identifier, "Identifier registered");
                Ok(true)
            }
        }
    }

    /// Forget `identifier` and its hidden set. Returns whether it existed.
    pub fn remove_identifier(&self, identifier: &str) -> Result<bool, StoreError> {
        if identifier.is_empty() {
            return Ok(false);
        }
        let existed = match self.cache.entry(identifier.to_string()) {
            Entry::Occupied(occupied) => {
                self.kv.delete(identifier).inspect_err(|e| self.report(identifier, e))?;
                occupied.remove();
                true
            }
            Entry::Vacant(_) => self
                .kv
                .delete(identifier)
                .inspect_err(|e| self.report(identifier, e))?,
        };
        if existed {
            info!(identifier = %identifier, "Identifier removed");
        }
        Ok(existed)
    }

    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.cache.contains_key(identifier)
    }

    /// Every known identifier, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cache.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn persist(&self, identifier: &str, set: &HiddenSet) -> Result<(), StoreError> {
        self.kv
            .set(identifier, &set.to_string())
            .inspect_err(|e| self.report(identifier, e))
    }

    fn report(&self, identifier: &str, error: &StoreError) {
        crate::metrics::record_store_error(error.error_code());
        warn!(identifier = %identifier, error = %error, "Visibility store write failed");
    }
}
