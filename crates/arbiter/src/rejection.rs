use super::*;
use tycoon_core::*;
use tycoon_records::*;

/// An action or vote refused by the arbiter. No state changed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("another action is in flight for this game")]
    LockContention,
    #[error("game {0} not found")]
    UnknownGame(GameId),
    #[error("player {0} is not seated in this game")]
    UnknownPlayer(UserId),
    #[error("game is {0}")]
    NotRunning(Status),
    #[error("it is player {current}'s turn")]
    NotYourTurn { current: UserId },
    #[error("{action} is not allowed while {phase}")]
    Illegal { action: Action, phase: Phase },
    #[error("balance {balance} cannot cover price {price}")]
    InsufficientBalance { balance: Money, price: Money },
    #[error("players cannot vote against themselves")]
    SelfVote,
    #[error("player {0} cannot vote in this game")]
    Ineligible(UserId),
    #[error("player {0} is neither timing out nor over the strike limit")]
    NotRemovable(UserId),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl Rejection {
    /// True for refusals caused by the caller rather than by infrastructure.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::LockContention | Self::Persistence(_))
    }
}
