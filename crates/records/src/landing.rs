use super::*;
use tycoon_core::*;

/// What the rules collaborator says happens on arrival at a square.
/// Every variant that carries effects (salary, rent, taxes) expects them
/// applied in the same batch as the move.
#[derive(Debug, Clone, PartialEq)]
pub enum Landing {
    /// Unowned property the player may buy.
    Purchasable {
        property: PropertyId,
        price: Money,
        effects: Vec<Effect>,
    },
    /// Square sends the player to jail; the turn ends.
    GoToJail,
    /// Nothing left to decide; the turn ends after the effects.
    Settled { effects: Vec<Effect> },
}

impl Landing {
    pub fn effects(&self) -> &[Effect] {
        match self {
            Self::Purchasable { effects, .. } | Self::Settled { effects } => effects,
            Self::GoToJail => &[],
        }
    }
}
