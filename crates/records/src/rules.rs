use super::*;
use tycoon_core::*;

/// Board and property rules.
/// Pricing, rent, and disposal policy live behind this seam.
#[async_trait::async_trait]
pub trait Rules: Send + Sync {
    /// Resolve the player's arrival at `to`.
    async fn land(
        &self,
        game: &GameSession,
        player: &Player,
        to: Square,
        passed_go: bool,
    ) -> Result<Landing, StoreError>;
    /// Effects that dispose of a removed player's assets.
    async fn dispose(&self, _: &GameSession, player: &Player) -> Result<Vec<Effect>, StoreError> {
        Ok(vec![Effect::Surrender {
            user: player.user_id,
        }])
    }
    /// Built-in purchase decision for automated seats without a reachable agent.
    fn should_buy(&self, player: &Player, price: Money) -> bool {
        player.balance - price >= FALLBACK_RESERVE
    }
}

/// Cash an automated seat keeps on hand after buying.
pub const FALLBACK_RESERVE: Money = 200;

/// Rules for a board with no properties.
/// Passing GO pays salary and the jail corner sends players to jail.
pub struct Barren;

#[async_trait::async_trait]
impl Rules for Barren {
    async fn land(
        &self,
        _: &GameSession,
        player: &Player,
        to: Square,
        passed_go: bool,
    ) -> Result<Landing, StoreError> {
        if to == GO_TO_JAIL {
            return Ok(Landing::GoToJail);
        }
        Ok(Landing::Settled {
            effects: salary(player, passed_go),
        })
    }
}

/// Square that sends the lander to jail.
pub const GO_TO_JAIL: Square = 30;

/// GO salary effect, if earned.
pub fn salary(player: &Player, passed_go: bool) -> Vec<Effect> {
    passed_go
        .then(|| Effect::Credit {
            user: player.user_id,
            amount: GO_SALARY,
        })
        .into_iter()
        .collect()
}
