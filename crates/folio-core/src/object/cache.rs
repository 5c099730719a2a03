//! Identity cache of an object handler.
//!
//! Maps instance ids to the shared in-memory instance last handed out for
//! them. A weakly cached instance is not kept alive by the cache: once every
//! caller has dropped its [`SharedInstance`], the entry reads as absent and
//! the next `get` fetches from the store again.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{Instance, InstanceId};

/// An instance shared between the cache and its callers.
pub type SharedInstance = Arc<RwLock<Instance>>;

/// How an instance is retained after it passes through a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Not cached.
    None,
    /// Cached while some caller still holds the instance.
    #[default]
    Weak,
    /// Cached until released or cleared.
    Strong,
}

/// Cache state of one instance id.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// Known to the cache but deliberately not retained.
    Uncached,
    /// Non-owning handle, live only while a caller holds the instance.
    WeakCached(Weak<RwLock<Instance>>),
    /// Owning handle.
    StronglyCached(SharedInstance),
}

impl CacheEntry {
    fn for_policy(policy: CachePolicy, instance: &SharedInstance) -> Self {
        match policy {
            CachePolicy::None => CacheEntry::Uncached,
            CachePolicy::Weak => CacheEntry::WeakCached(Arc::downgrade(instance)),
            CachePolicy::Strong => CacheEntry::StronglyCached(Arc::clone(instance)),
        }
    }

    /// Policy this entry was created with, regardless of liveness.
    fn declared_policy(&self) -> CachePolicy {
        match self {
            CacheEntry::Uncached => CachePolicy::None,
            CacheEntry::WeakCached(_) => CachePolicy::Weak,
            CacheEntry::StronglyCached(_) => CachePolicy::Strong,
        }
    }

    /// Effective policy. An expired weak handle reports [`CachePolicy::None`].
    pub fn policy(&self) -> CachePolicy {
        match self {
            CacheEntry::WeakCached(weak) if weak.strong_count() == 0 => CachePolicy::None,
            other => other.declared_policy(),
        }
    }

    /// The cached instance, if still alive.
    pub fn upgrade(&self) -> Option<SharedInstance> {
        match self {
            CacheEntry::Uncached => None,
            CacheEntry::WeakCached(weak) => weak.upgrade(),
            CacheEntry::StronglyCached(shared) => Some(Arc::clone(shared)),
        }
    }
}

/// Per-handler identity cache.
///
/// Not synchronized; defined for use through one handler only.
#[derive(Debug, Default)]
pub struct InstanceCache {
    entries: HashMap<InstanceId, CacheEntry>,
    default_policy: CachePolicy,
}

impl InstanceCache {
    /// Create an empty cache.
    pub fn new(default_policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            default_policy,
        }
    }

    /// Policy applied to ids seen for the first time.
    pub fn default_policy(&self) -> CachePolicy {
        self.default_policy
    }

    /// Change the policy applied to ids seen from now on.
    pub fn set_default_policy(&mut self, policy: CachePolicy) {
        self.default_policy = policy;
    }

    /// Entry of an id.
    pub fn entry(&self, id: &InstanceId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Effective policy of an id. Unknown ids report [`CachePolicy::None`].
    pub fn policy(&self, id: &InstanceId) -> CachePolicy {
        self.entries
            .get(id)
            .map_or(CachePolicy::None, CacheEntry::policy)
    }

    /// The live cached instance of an id.
    pub fn lookup(&self, id: &InstanceId) -> Option<SharedInstance> {
        self.entries.get(id).and_then(CacheEntry::upgrade)
    }

    /// Record that `instance` passed through the handler.
    ///
    /// Ids seen for the first time get the default policy. Known ids keep
    /// their policy and are re-pointed at `instance`.
    pub(crate) fn admit(&mut self, id: InstanceId, instance: &SharedInstance) {
        let policy = self
            .entries
            .get(&id)
            .map_or(self.default_policy, CacheEntry::declared_policy);
        self.entries.insert(id, CacheEntry::for_policy(policy, instance));
    }

    /// Cache `instance` under `policy`, replacing any previous entry.
    pub(crate) fn set_policy(&mut self, id: InstanceId, instance: &SharedInstance, policy: CachePolicy) {
        self.entries.insert(id, CacheEntry::for_policy(policy, instance));
    }

    /// Forget an id entirely. Returns whether it had an entry.
    pub fn clear(&mut self, id: &InstanceId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Turn every weak entry into [`CacheEntry::Uncached`].
    pub fn release_weak(&mut self) {
        for entry in self.entries.values_mut() {
            if matches!(entry, CacheEntry::WeakCached(_)) {
                *entry = CacheEntry::Uncached;
            }
        }
    }

    /// Turn every strong entry into [`CacheEntry::Uncached`], dropping the
    /// cache's ownership of those instances.
    pub fn release_strong(&mut self) {
        for entry in self.entries.values_mut() {
            if matches!(entry, CacheEntry::StronglyCached(_)) {
                *entry = CacheEntry::Uncached;
            }
        }
    }

    /// Turn every entry into [`CacheEntry::Uncached`].
    pub fn release_all(&mut self) {
        for entry in self.entries.values_mut() {
            *entry = CacheEntry::Uncached;
        }
    }

    /// Forget every id, so the default policy applies to all of them again.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose instance is still reachable.
    pub fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.policy() != CachePolicy::None)
            .count()
    }
}
