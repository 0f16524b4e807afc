use serde::Deserialize;
use serde::Serialize;

/// Frames a viewer may send.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinGameRoom { code: String },
    LeaveGameRoom { code: String },
}

/// Frames sent to viewers.
/// Updates carry no state; clients refetch the snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    GameUpdate {
        #[serde(rename = "gameCode")]
        game_code: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn update(code: &str) -> Self {
        Self::GameUpdate {
            game_code: code.to_string(),
        }
    }
    pub fn error<E>(e: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Error {
            message: e.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
