use super::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tycoon_agents::DecisionKind;
use tycoon_core::*;
use tycoon_records::*;

/// Attempts an automated seat makes against a busy lock before giving up.
/// The roll window still bounds the turn if it does.
const PILOT_RETRIES: usize = 40;
const PILOT_BACKOFF: Duration = Duration::from_millis(50);

impl Arbiter {
    /// Drive an automated seat through its turn in the background.
    pub(crate) fn pilot(self: &Arc<Self>, table: &Table, game: GameId, user: UserId) {
        if !table.board(user) {
            return;
        }
        let arbiter = self.clone();
        tokio::spawn(async move {
            if let Err(e) = arbiter.drive(game, user).await {
                log::warn!("[autopilot] game {} player {} stopped: {}", game, user, e);
            }
            if let Some(table) = arbiter.existing(game) {
                table.disembark(user);
            }
        });
    }

    /// Roll, decide on any purchase, end the turn.
    async fn drive(self: &Arc<Self>, game: GameId, user: UserId) -> Result<(), Rejection> {
        let seat = self.seat(game, user).await?;
        let opening = match seat.in_jail {
            true => Action::RollJail,
            false => Action::Roll,
        };
        let mut outcome = self.insist(game, user, opening).await?;
        if let Outcome::Released { .. } = outcome {
            outcome = self.insist(game, user, Action::Roll).await?;
        }
        if let Some(Phase::AwaitingBuyDecision { property, price }) = outcome.phase() {
            let seat = self.seat(game, user).await?;
            let choice = self.choose(game, &seat, property, price).await;
            match self.insist(game, user, choice).await {
                Err(Rejection::InsufficientBalance { .. }) => {
                    self.insist(game, user, Action::Skip).await?;
                }
                other => {
                    other?;
                }
            }
        }
        self.insist(game, user, Action::EndTurn).await?;
        Ok(())
    }

    /// Ask the seat's agent whether to buy; built-in logic when it cannot answer.
    /// Never called with the action lock held.
    async fn choose(
        &self,
        game: GameId,
        seat: &Player,
        property: PropertyId,
        price: Money,
    ) -> Action {
        let context = json!({
            "myBalance": seat.balance,
            "position": seat.position,
            "landedProperty": { "id": property, "price": price },
        });
        let decision = match self.router() {
            Some(router) => {
                router
                    .route(game, seat.seat, DecisionKind::Property, context)
                    .await
            }
            None => None,
        };
        match decision {
            Some(decision) if decision.is("buy") => Action::Buy,
            Some(decision) if decision.is("skip") => Action::Skip,
            Some(decision) => {
                log::warn!(
                    "[autopilot] game {} seat {} unusable decision {:?}",
                    game,
                    seat.seat,
                    decision.action
                );
                self.fallback(seat, price)
            }
            None => self.fallback(seat, price),
        }
    }

    fn fallback(&self, seat: &Player, price: Money) -> Action {
        match self.rules().should_buy(seat, price) {
            true => Action::Buy,
            false => Action::Skip,
        }
    }

    /// Attempt, backing off while another action holds the lock.
    async fn insist(
        self: &Arc<Self>,
        game: GameId,
        user: UserId,
        action: Action,
    ) -> Result<Outcome, Rejection> {
        for _ in 0..PILOT_RETRIES {
            match self.attempt(game, user, action).await {
                Err(Rejection::LockContention) => tokio::time::sleep(PILOT_BACKOFF).await,
                other => return other,
            }
        }
        Err(Rejection::LockContention)
    }

    async fn seat(&self, game: GameId, user: UserId) -> Result<Player, Rejection> {
        self.store()
            .players(game)
            .await?
            .into_iter()
            .find(|p| p.user_id == user)
            .ok_or(Rejection::UnknownPlayer(user))
    }
}
