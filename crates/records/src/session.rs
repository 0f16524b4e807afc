use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tycoon_core::*;

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Running,
    Finished,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
        }
    }
}

impl TryFrom<&str> for Status {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "RUNNING" => Ok(Self::Running),
            "FINISHED" => Ok(Self::Finished),
            other => Err(format!("unknown status {}", other)),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies exactly one turn: who owns it and when it started.
/// Two turns by the same player never share a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    pub owner: UserId,
    pub started: DateTime<Utc>,
}

/// Persistent game session.
/// The action lock is not persisted; it lives in the arbiter's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: GameId,
    pub code: String,
    pub status: Status,
    pub current_turn_player_id: Option<UserId>,
    pub turn_started_at: DateTime<Utc>,
    pub winner: Option<UserId>,
}

impl GameSession {
    pub fn running(id: GameId, code: &str, owner: UserId) -> Self {
        Self {
            id,
            code: code.to_string(),
            status: Status::Running,
            current_turn_player_id: Some(owner),
            turn_started_at: Utc::now(),
            winner: None,
        }
    }
    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }
    pub fn stamp(&self) -> Option<Stamp> {
        self.current_turn_player_id.map(|owner| Stamp {
            owner,
            started: self.turn_started_at,
        })
    }
}
