use super::*;
use serde::Deserialize;
use serde::Serialize;
use tycoon_core::*;
use tycoon_records::PropertyId;

/// Player request against the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Action {
    Roll,
    RollJail,
    Buy,
    Skip,
    EndTurn,
}

impl Action {
    /// Phase the turn sits in while this action is being applied.
    pub fn transient(&self) -> Option<Phase> {
        match self {
            Self::Roll => Some(Phase::Rolling),
            Self::RollJail => Some(Phase::JailRollPending),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Roll => f.write_str("roll"),
            Self::RollJail => f.write_str("roll-jail"),
            Self::Buy => f.write_str("buy"),
            Self::Skip => f.write_str("skip"),
            Self::EndTurn => f.write_str("end-turn"),
        }
    }
}

/// What a confirmed action or timeout did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Rolled {
        dice: [u8; 2],
        position: Square,
        jailed: bool,
        phase: Phase,
    },
    Released {
        dice: [u8; 2],
    },
    Stayed {
        dice: [u8; 2],
    },
    Bought {
        property: PropertyId,
        price: Money,
    },
    Skipped,
    Ended {
        next: Option<UserId>,
    },
    TimedOut {
        user: UserId,
        counted: bool,
        next: Option<UserId>,
    },
}

impl Outcome {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Rolled { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn actions_parse_from_kind_tags() {
        let parsed = serde_json::from_str::<Action>(r#"{"kind":"roll-jail"}"#).unwrap();
        assert_eq!(parsed, Action::RollJail);
        let parsed = serde_json::from_str::<Action>(r#"{"kind":"end-turn"}"#).unwrap();
        assert_eq!(parsed, Action::EndTurn);
        assert!(serde_json::from_str::<Action>(r#"{"kind":"bribe"}"#).is_err());
    }
    #[test]
    fn only_rolls_have_transient_phases() {
        assert_eq!(Action::Roll.transient(), Some(Phase::Rolling));
        assert_eq!(Action::RollJail.transient(), Some(Phase::JailRollPending));
        assert_eq!(Action::Buy.transient(), None);
    }
}
