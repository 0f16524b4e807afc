use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tycoon_core::*;

/// Registered agent endpoint for one slot, optionally scoped to one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub key: String,
    pub slot: Slot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    pub agent_id: String,
    pub callback_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Registry key: `game_{id}_slot_{slot}` when scoped, `slot_{slot}` otherwise.
pub fn key(game: Option<GameId>, slot: Slot) -> String {
    match game {
        Some(game) => format!("game_{}_slot_{}", game, slot),
        None => format!("slot_{}", slot),
    }
}

/// Caller input that cannot become a binding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Invalid {
    #[error("missing required field {0}")]
    Missing(&'static str),
    #[error("slot {0} out of range (2-8)")]
    Slot(i64),
    #[error("callbackUrl must be an http(s) URL, got {0:?}")]
    Callback(String),
}

/// Raw registration input.
/// Everything is optional so missing fields surface as [`Invalid`] rather
/// than as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub slot: Option<i64>,
    pub agent_id: Option<String>,
    pub callback_url: Option<String>,
    pub chain_id: Option<u64>,
    pub name: Option<String>,
    pub game_id: Option<GameId>,
}

impl Registration {
    pub fn new(slot: i64, agent_id: &str, callback_url: &str) -> Self {
        Self {
            slot: Some(slot),
            agent_id: Some(agent_id.to_string()),
            callback_url: Some(callback_url.to_string()),
            ..Self::default()
        }
    }
    pub fn scoped(mut self, game: GameId) -> Self {
        self.game_id = Some(game);
        self
    }
    /// Checks the input and stamps the binding with the current time.
    pub fn validate(self) -> Result<Binding, Invalid> {
        let slot = self.slot.ok_or(Invalid::Missing("slot"))?;
        let slot = slot_in_range(slot)?;
        let agent_id = self
            .agent_id
            .filter(|a| !a.trim().is_empty())
            .ok_or(Invalid::Missing("agentId"))?;
        let callback_url = self.callback_url.ok_or(Invalid::Missing("callbackUrl"))?;
        reqwest::Url::parse(&callback_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .filter(|u| u.has_host())
            .ok_or_else(|| Invalid::Callback(callback_url.clone()))?;
        Ok(Binding {
            key: key(self.game_id, slot),
            slot,
            game_id: self.game_id,
            agent_id,
            callback_url,
            chain_id: self.chain_id,
            name: self.name,
            registered_at: Utc::now(),
        })
    }
}

/// Narrows a caller-supplied slot to the agent-bindable range.
pub fn slot_in_range(slot: i64) -> Result<Slot, Invalid> {
    Slot::try_from(slot)
        .ok()
        .filter(|s| (MIN_SLOT..=MAX_SLOT).contains(s))
        .ok_or(Invalid::Slot(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn keys_distinguish_scope() {
        assert_eq!(key(None, 3), "slot_3");
        assert_eq!(key(Some(7), 3), "game_7_slot_3");
    }
    #[test]
    fn accepts_http_and_https() {
        assert!(Registration::new(2, "x", "http://a:4077").validate().is_ok());
        assert!(Registration::new(8, "x", "https://agent.example/api").validate().is_ok());
    }
    #[test]
    fn rejects_slots_out_of_range() {
        for slot in [-1, 0, 1, 9, 300] {
            assert_eq!(
                Registration::new(slot, "x", "http://a").validate(),
                Err(Invalid::Slot(slot))
            );
        }
    }
    #[test]
    fn rejects_non_http_callbacks() {
        for url in ["ftp://a", "ws://a", "not a url", "file:///etc/passwd"] {
            assert!(matches!(
                Registration::new(2, "x", url).validate(),
                Err(Invalid::Callback(_))
            ));
        }
    }
    #[test]
    fn rejects_missing_fields() {
        let mut reg = Registration::new(2, "x", "http://a");
        reg.agent_id = None;
        assert_eq!(reg.validate(), Err(Invalid::Missing("agentId")));
        let reg = Registration {
            slot: None,
            ..Registration::new(2, "x", "http://a")
        };
        assert_eq!(reg.validate(), Err(Invalid::Missing("slot")));
    }
    #[test]
    fn scoped_bindings_carry_the_game() {
        let binding = Registration::new(3, "x", "http://a").scoped(7).validate().unwrap();
        assert_eq!(binding.key, "game_7_slot_3");
        assert_eq!(binding.game_id, Some(7));
    }
}
