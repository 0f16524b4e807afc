use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;
use tycoon_core::*;

type Payload = serde_json::Value;

#[derive(Debug, Clone)]
struct Entry {
    payload: Payload,
    written: Instant,
}

/// One key's entry and the generation of its last write or invalidation.
/// Generations come from one counter and never repeat.
#[derive(Debug, Clone)]
struct Slot {
    entry: Option<Entry>,
    generation: u64,
}

/// Snapshot cache keyed by `game:code:{code}`.
/// Expiry is evaluated on read; stale entries linger until overwritten,
/// invalidated, or purged.
pub struct SessionCache {
    ttl: Duration,
    clock: AtomicU64,
    slots: RwLock<HashMap<String, Slot>>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(CACHE_TTL_SECS))
    }
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            clock: AtomicU64::new(0),
            slots: RwLock::new(HashMap::new()),
        }
    }
    pub fn key(code: &str) -> String {
        format!("game:code:{}", code)
    }
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
    pub fn get(&self, code: &str) -> Option<Payload> {
        let now = Instant::now();
        self.slots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&Self::key(code))
            .and_then(|slot| slot.entry.as_ref())
            .filter(|e| now.duration_since(e.written) < self.ttl)
            .map(|e| e.payload.clone())
    }
    pub fn set(&self, code: &str, payload: Payload) {
        let slot = Slot {
            entry: Some(Entry {
                payload,
                written: Instant::now(),
            }),
            generation: self.tick(),
        };
        self.slots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(Self::key(code), slot);
    }
    /// Best-effort: forgetting an absent key is fine.
    /// Any load already in flight for `code` will not be written back.
    pub fn invalidate(&self, code: &str) {
        let generation = self.tick();
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let present = match slots.get_mut(&Self::key(code)) {
            Some(slot) => {
                slot.generation = generation;
                slot.entry.take().is_some()
            }
            None => false,
        };
        log::trace!("[cache] invalidate {} (present: {})", code, present);
    }
    /// Serves a fresh entry or recomputes it with `load` and repopulates.
    /// Loader failures pass through untouched and nothing is cached. The
    /// result is only cached if nothing wrote or invalidated `code` meanwhile.
    pub async fn fetch<F, Fut, E>(&self, code: &str, load: F) -> Result<Option<Payload>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Payload>, E>>,
    {
        if let Some(hit) = self.get(code) {
            return Ok(Some(hit));
        }
        log::debug!("[cache] miss {}", code);
        let seen = self.claim(code);
        let loaded = load().await?;
        if let Some(ref payload) = loaded {
            self.settle(code, seen, payload.clone());
        }
        Ok(loaded)
    }
    /// Drops every expired or empty slot, returning how many entries went.
    pub fn purge(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let before = slots.values().filter(|s| s.entry.is_some()).count();
        slots.retain(|_, slot| {
            slot.entry
                .as_ref()
                .is_some_and(|e| now.duration_since(e.written) < self.ttl)
        });
        before - slots.len()
    }
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }
    /// Generation a load for `code` must still see to write back.
    fn claim(&self, code: &str) -> u64 {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        match slots.get(&Self::key(code)) {
            Some(slot) => slot.generation,
            None => {
                let generation = self.tick();
                slots.insert(
                    Self::key(code),
                    Slot {
                        entry: None,
                        generation,
                    },
                );
                generation
            }
        }
    }
    fn settle(&self, code: &str, seen: u64, payload: Payload) {
        let generation = self.tick();
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        match slots.get_mut(&Self::key(code)) {
            Some(slot) if slot.generation == seen => {
                slot.entry = Some(Entry {
                    payload,
                    written: Instant::now(),
                });
                slot.generation = generation;
            }
            _ => log::debug!("[cache] dropped superseded load of {}", code),
        }
    }
}
