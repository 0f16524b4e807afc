use serde::Serialize;
use tycoon_core::*;
use tycoon_records::PropertyId;

/// Position of the current turn in its state machine.
/// `Rolling` and `JailRollPending` exist only while the action lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    AwaitingRoll,
    Rolling,
    JailRollPending,
    AwaitingBuyDecision { property: PropertyId, price: Money },
    JailStay,
    TurnEnding,
}

impl Phase {
    /// Whether the turn may be ended voluntarily from here.
    pub fn can_end(&self) -> bool {
        matches!(
            self,
            Self::TurnEnding | Self::JailStay | Self::AwaitingBuyDecision { .. }
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::AwaitingRoll => f.write_str("awaiting roll"),
            Self::Rolling => f.write_str("rolling"),
            Self::JailRollPending => f.write_str("rolling for jail"),
            Self::AwaitingBuyDecision { property, price } => {
                write!(f, "deciding on P{} at {}", property, price)
            }
            Self::JailStay => f.write_str("staying in jail"),
            Self::TurnEnding => f.write_str("ending turn"),
        }
    }
}
