use super::*;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tycoon_core::*;

/// Limits enforced by a [`Gate`].
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    pub max_connections: usize,
    pub events_per_window: u32,
    pub window: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_connections: MAX_CONNECTIONS_PER_ORIGIN,
            events_per_window: EVENTS_PER_WINDOW,
            window: Duration::from_secs(EVENT_WINDOW_SECS),
        }
    }
}

/// Connection refused at the door.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("too many connections from {origin} (limit {limit})")]
pub struct Rejected {
    pub origin: IpAddr,
    pub limit: usize,
}

/// Event dropped for exceeding the connection's budget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded: at most {limit} events per {seconds}s, slow down")]
pub struct Throttled {
    pub limit: u32,
    pub seconds: u64,
}

/// Admission control for socket clients and HTTP actions.
/// Counters and windows are process-wide; each mutation touches one key.
pub struct Gate {
    config: GateConfig,
    origins: Mutex<HashMap<IpAddr, usize>>,
    windows: Mutex<HashMap<ID<Connection>, Window>>,
    requests: Mutex<HashMap<IpAddr, Window>>,
}

impl Gate {
    pub fn new(config: GateConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            origins: Mutex::new(HashMap::new()),
            windows: Mutex::new(HashMap::new()),
            requests: Mutex::new(HashMap::new()),
        })
    }
    pub fn config(&self) -> GateConfig {
        self.config
    }
    /// Admits a connection from `origin` unless it already holds the cap.
    pub fn admit(self: &Arc<Self>, origin: IpAddr) -> Result<Ticket, Rejected> {
        let mut origins = self.origins.lock().unwrap_or_else(|e| e.into_inner());
        let count = origins.entry(origin).or_insert(0);
        if *count >= self.config.max_connections {
            log::warn!("[gate] rejecting {} at {} connections", origin, count);
            return Err(Rejected {
                origin,
                limit: self.config.max_connections,
            });
        }
        *count += 1;
        log::debug!("[gate] admitted {} ({} open)", origin, count);
        drop(origins);
        Ok(Ticket::new(self.clone(), origin))
    }
    /// Counts an event for `id`; anything past the budget is throttled.
    pub fn allow(&self, id: ID<Connection>) -> Result<(), Throttled> {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let hits = windows
            .entry(id)
            .or_insert_with(|| Window::open(now, self.config.window))
            .hit(now, self.config.window);
        if hits > self.config.events_per_window {
            log::debug!("[gate] throttled {} ({} events)", id, hits);
            return Err(Throttled {
                limit: self.config.events_per_window,
                seconds: self.config.window.as_secs(),
            });
        }
        Ok(())
    }
    /// Counts an HTTP action from `origin` against the same per-window budget.
    pub fn limit(&self, origin: IpAddr) -> Result<(), Throttled> {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        let hits = requests
            .entry(origin)
            .or_insert_with(|| Window::open(now, self.config.window))
            .hit(now, self.config.window);
        if hits > self.config.events_per_window {
            log::debug!("[gate] throttled requests from {} ({})", origin, hits);
            return Err(Throttled {
                limit: self.config.events_per_window,
                seconds: self.config.window.as_secs(),
            });
        }
        Ok(())
    }
    /// Drops request windows that have lapsed, returning how many went.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        let before = requests.len();
        requests.retain(|_, window| window.resets() > now);
        before - requests.len()
    }
    /// Open connections currently held by `origin`.
    pub fn connections(&self, origin: IpAddr) -> usize {
        self.origins
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&origin)
            .copied()
            .unwrap_or(0)
    }
    pub(crate) fn release(&self, origin: IpAddr, id: ID<Connection>) {
        let mut origins = self.origins.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = origins.get_mut(&origin) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                origins.remove(&origin);
            }
        }
        drop(origins);
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        log::debug!("[gate] released {} from {}", id, origin);
    }
}
