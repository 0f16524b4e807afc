use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tycoon_core::*;

/// Process-wide agent bindings.
/// Lives for the lifetime of the process; nothing survives a restart.
#[derive(Default)]
pub struct Registry {
    bindings: RwLock<HashMap<String, Binding>>,
}

impl Registry {
    /// Validates and stores a registration, replacing any binding on the same key.
    pub async fn register(&self, registration: Registration) -> Result<Binding, Invalid> {
        let binding = registration.validate()?;
        let previous = self
            .bindings
            .write()
            .await
            .insert(binding.key.clone(), binding.clone());
        match previous {
            Some(old) => log::info!(
                "[registry] {} rebound {} -> {}",
                binding.key,
                old.agent_id,
                binding.agent_id
            ),
            None => log::info!("[registry] {} bound to {}", binding.key, binding.agent_id),
        }
        Ok(binding)
    }
    /// Removes a binding if present. Returns the key and whether it existed.
    pub async fn unregister(&self, slot: Slot, game: Option<GameId>) -> (String, bool) {
        let key = key(game, slot);
        let deleted = self.bindings.write().await.remove(&key).is_some();
        log::info!("[registry] unbind {} (existed: {})", key, deleted);
        (key, deleted)
    }
    /// Game-specific binding if one exists, otherwise the global slot binding.
    pub async fn lookup(&self, game: GameId, slot: Slot) -> Option<Binding> {
        let bindings = self.bindings.read().await;
        bindings
            .get(&key(Some(game), slot))
            .or_else(|| bindings.get(&key(None, slot)))
            .cloned()
    }
    pub async fn list(&self) -> Vec<Binding> {
        let mut all = self
            .bindings
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[tokio::test]
    async fn game_binding_wins_then_falls_back_to_global() {
        let registry = Registry::default();
        registry
            .register(Registration::new(3, "global", "http://g"))
            .await
            .unwrap();
        registry
            .register(Registration::new(3, "scoped", "http://s").scoped(7))
            .await
            .unwrap();
        assert_eq!(registry.lookup(7, 3).await.unwrap().agent_id, "scoped");
        assert_eq!(registry.lookup(8, 3).await.unwrap().agent_id, "global");
        registry.unregister(3, Some(7)).await;
        assert_eq!(registry.lookup(7, 3).await.unwrap().agent_id, "global");
    }
    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = Registry::default();
        registry
            .register(Registration::new(2, "x", "http://a"))
            .await
            .unwrap();
        assert_eq!(registry.unregister(2, None).await, ("slot_2".to_string(), true));
        assert_eq!(registry.unregister(2, None).await, ("slot_2".to_string(), false));
    }
    #[tokio::test]
    async fn invalid_registrations_store_nothing() {
        let registry = Registry::default();
        assert!(
            registry
                .register(Registration::new(9, "x", "http://a"))
                .await
                .is_err()
        );
        assert!(registry.list().await.is_empty());
    }
    #[tokio::test]
    async fn list_is_ordered_by_key() {
        let registry = Registry::default();
        for slot in [5, 2, 4] {
            registry
                .register(Registration::new(slot, "x", "http://a"))
                .await
                .unwrap();
        }
        let keys = registry
            .list()
            .await
            .into_iter()
            .map(|b| b.key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["slot_2", "slot_4", "slot_5"]);
    }
}
