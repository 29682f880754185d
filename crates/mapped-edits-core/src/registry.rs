use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier standing in for a provider across the process boundary.
///
/// Handles are allocated monotonically by the side that owns the provider
/// and are never reused, so a stale handle can only ever resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderHandle(u64);

impl ProviderHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle-keyed table of registered providers.
///
/// The registry is the arena side of the arena+index scheme: it owns the
/// entries, callers only ever hold [`ProviderHandle`]s. All operations are
/// synchronous and safe to call concurrently from in-flight requests.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// let handle = registry.register("provider-a");
///
/// assert_eq!(registry.resolve(handle), Some("provider-a"));
///
/// registry.unregister(handle);
/// registry.unregister(handle); // no-op
/// assert_eq!(registry.resolve(handle), None);
/// ```
pub struct ProviderRegistry<T> {
    next_handle: AtomicU64,
    entries: DashMap<ProviderHandle, T>,
}

impl<T: Clone> ProviderRegistry<T> {
    /// Creates an empty registry whose first handle is `0`.
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(0),
            entries: DashMap::new(),
        }
    }

    /// Stores `entry` under a fresh handle and returns the handle.
    pub fn register(&self, entry: T) -> ProviderHandle {
        let handle = self.allocate();
        self.entries.insert(handle, entry);
        handle
    }

    /// Stores `entry` under a handle allocated by the remote side.
    ///
    /// Used by the side that only mirrors registrations. Returns the entry
    /// previously stored under the same handle, if any.
    pub fn insert(&self, handle: ProviderHandle, entry: T) -> Option<T> {
        self.entries.insert(handle, entry)
    }

    /// Removes the entry for `handle` and returns it.
    ///
    /// Unknown or already removed handles are a no-op.
    pub fn unregister(&self, handle: ProviderHandle) -> Option<T> {
        self.entries.remove(&handle).map(|(_, entry)| entry)
    }

    /// Looks up the entry for `handle`.
    pub fn resolve(&self, handle: ProviderHandle) -> Option<T> {
        self.entries.get(&handle).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, handle: ProviderHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Returns all live entries ordered by handle.
    ///
    /// Handles are monotonic, so this is registration order for locally
    /// allocated handles and arrival order for mirrored ones.
    pub fn snapshot(&self) -> Vec<(ProviderHandle, T)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(handle, _)| *handle);
        entries
    }

    /// Removes every registration at once and returns how many were dropped.
    pub fn teardown_all(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        tracing::debug!("released {} provider registrations", count);
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn allocate(&self) -> ProviderHandle {
        ProviderHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

impl<T: Clone> Default for ProviderRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ProviderRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("next_handle", &self.next_handle.load(Ordering::Relaxed))
            .field("entries", &self.entries.len())
            .finish()
    }
}
