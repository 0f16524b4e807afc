use super::*;
use serde::Serialize;

/// Read model served to viewers after a refetch signal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub game: GameSession,
    pub players: Vec<Player>,
}

impl Snapshot {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
