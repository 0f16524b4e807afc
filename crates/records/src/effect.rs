use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use tycoon_core::*;

/// Property identifier as known to the rules collaborator.
pub type PropertyId = i64;

/// A single state change requested by the arbiter.
/// Batches of effects are applied atomically by the [`crate::Store`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Move { user: UserId, position: Square },
    Credit { user: UserId, amount: Money },
    Debit { user: UserId, amount: Money },
    Purchase { user: UserId, property: PropertyId, price: Money },
    Jail { user: UserId },
    Release { user: UserId },
    /// Counts a missed roll window against the player.
    Timeout { user: UserId },
    /// Clears the timeout streak after a voluntary turn.
    Settle { user: UserId },
    /// Returns every asset the player holds to the bank.
    Surrender { user: UserId },
    Remove { user: UserId },
    Advance { next: UserId, at: DateTime<Utc> },
    Finish { winner: Option<UserId> },
}

impl Effect {
    pub fn user(&self) -> Option<UserId> {
        match self {
            Self::Move { user, .. }
            | Self::Credit { user, .. }
            | Self::Debit { user, .. }
            | Self::Purchase { user, .. }
            | Self::Jail { user }
            | Self::Release { user }
            | Self::Timeout { user }
            | Self::Settle { user }
            | Self::Surrender { user }
            | Self::Remove { user } => Some(*user),
            Self::Advance { next, .. } => Some(*next),
            Self::Finish { winner } => *winner,
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Move { user, position } => write!(f, "U{} -> square {}", user, position),
            Self::Credit { user, amount } => write!(f, "U{} +{}", user, amount),
            Self::Debit { user, amount } => write!(f, "U{} -{}", user, amount),
            Self::Purchase {
                user,
                property,
                price,
            } => write!(f, "U{} buys P{} for {}", user, property, price),
            Self::Jail { user } => write!(f, "U{} jailed", user),
            Self::Release { user } => write!(f, "U{} released", user),
            Self::Timeout { user } => write!(f, "U{} timed out", user),
            Self::Settle { user } => write!(f, "U{} settled", user),
            Self::Surrender { user } => write!(f, "U{} surrenders assets", user),
            Self::Remove { user } => write!(f, "U{} removed", user),
            Self::Advance { next, .. } => write!(f, "turn -> U{}", next),
            Self::Finish { winner: Some(w) } => write!(f, "finished, U{} wins", w),
            Self::Finish { winner: None } => write!(f, "finished"),
        }
    }
}
