use std::{
    collections::HashMap,
    net::IpAddr,
    sync::{Mutex, PoisonError},
};

/// Identity whose events are counted.
///
/// Pings and joins are tracked separately, so an IP that pinged ten times and
/// joined once reports `#10` and `#1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterKey {
    Ping(IpAddr),
    Join(IpAddr, String),
}

/// Sequence numbers handed out per identity.
pub trait EventCounter: Send + Sync {
    /// Increments the count for `key` and returns the value after the increment.
    fn increment(&self, key: CounterKey) -> u32;
}

/// In-memory counter store, reset on restart.
#[derive(Debug, Default)]
pub struct MemoryCounter {
    counts: Mutex<HashMap<CounterKey, u32>>,
}

impl MemoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CounterKey) -> u32 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get(key).copied().unwrap_or(0)
    }
}

impl EventCounter for MemoryCounter {
    fn increment(&self, key: CounterKey) -> u32 {
        // a panic elsewhere cannot leave a half-written count behind, so a
        // poisoned map is still usable
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }
}
