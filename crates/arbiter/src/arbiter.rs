use super::*;
use chrono::DateTime;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tycoon_agents::Router;
use tycoon_cache::SessionCache;
use tycoon_core::*;
use tycoon_records::*;

/// Serializes and validates every state-changing request for every game.
///
/// One action per game at a time; a second concurrent attempt is refused
/// with [`Rejection::LockContention`] rather than queued. The lock is
/// released on every path out of an attempt, success or failure.
pub struct Arbiter {
    store: Arc<dyn Store>,
    rules: Arc<dyn Rules>,
    dice: Arc<dyn Dice>,
    cache: Arc<SessionCache>,
    broadcast: Arc<dyn Broadcast>,
    router: Option<Arc<Router>>,
    timer: TimerConfig,
    tables: Mutex<HashMap<GameId, Arc<Table>>>,
}

/// What happens to the turn once a plan commits.
enum Then {
    Stay { phase: Phase },
    Pass(Option<Heir>),
}

/// Who asked for a lapse check.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Check {
    Alarm(Stamp),
    Tick,
    Sweep,
}

/// Player the turn passes to.
#[derive(Debug, Clone, Copy)]
struct Heir {
    stamp: Stamp,
    automated: bool,
}

struct Plan {
    effects: Vec<Effect>,
    then: Then,
    outcome: Outcome,
}

struct Passing {
    effects: Vec<Effect>,
    heir: Option<Heir>,
}

impl Arbiter {
    pub fn new(
        store: Arc<dyn Store>,
        rules: Arc<dyn Rules>,
        cache: Arc<SessionCache>,
        broadcast: Arc<dyn Broadcast>,
    ) -> Self {
        Self {
            store,
            rules,
            dice: Arc::new(Fair),
            cache,
            broadcast,
            router: None,
            timer: TimerConfig::default(),
            tables: Mutex::new(HashMap::new()),
        }
    }
    pub fn with_dice(mut self, dice: Arc<dyn Dice>) -> Self {
        self.dice = dice;
        self
    }
    /// Route automated seats' decisions through bound agents.
    pub fn with_router(mut self, router: Arc<Router>) -> Self {
        self.router = Some(router);
        self
    }
    pub fn with_timer(mut self, timer: TimerConfig) -> Self {
        self.timer = timer;
        self
    }
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
    pub fn rules(&self) -> &Arc<dyn Rules> {
        &self.rules
    }
    pub fn router(&self) -> Option<&Arc<Router>> {
        self.router.as_ref()
    }
    pub fn timer(&self) -> &TimerConfig {
        &self.timer
    }
    /// Phase of the game's current turn, if the arbiter has seen it.
    pub fn phase(&self, game: GameId) -> Option<Phase> {
        self.existing(game)?.current().map(|turn| turn.phase)
    }
    /// Games the arbiter currently holds turn state for.
    pub fn live(&self) -> usize {
        self.tables.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
    /// Table for `game` only if it is still live.
    pub(crate) fn existing(&self, game: GameId) -> Option<Arc<Table>> {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&game)
            .cloned()
    }
    pub fn table(&self, game: GameId) -> Arc<Table> {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(game)
            .or_default()
            .clone()
    }

    /// Validate and apply one player action.
    pub async fn attempt(
        self: &Arc<Self>,
        game: GameId,
        user: UserId,
        action: Action,
    ) -> Result<Outcome, Rejection> {
        let table = self.table(game);
        let _lock = table.try_lock().ok_or(Rejection::LockContention)?;
        let session = self.running(&table, game).await?;
        let stamp = session
            .stamp()
            .ok_or(Rejection::NotRunning(session.status))?;
        if stamp.owner != user {
            return Err(Rejection::NotYourTurn {
                current: stamp.owner,
            });
        }
        let players = self.store.players(game).await?;
        let player = players
            .iter()
            .find(|p| p.user_id == user)
            .ok_or(Rejection::UnknownPlayer(user))?;
        let turn = table.turn(stamp, self.timer.roll);
        if let Some(phase) = action.transient() {
            table.record(Turn { phase, ..turn });
        }
        let result = self
            .perform(&table, &session, &players, player, turn, action)
            .await;
        match result {
            Ok(ref outcome) => {
                log::debug!("[arbiter] game {} player {} {:?}", game, user, outcome)
            }
            Err(ref rejection) => {
                log::debug!(
                    "[arbiter] game {} player {} {}: {}",
                    game,
                    user,
                    action,
                    rejection
                );
                table.record(turn);
            }
        }
        result
    }

    /// Cast a vote to remove `target`; removes them once a majority agrees.
    pub async fn vote(
        self: &Arc<Self>,
        game: GameId,
        voter: UserId,
        target: UserId,
    ) -> Result<Ballot, Rejection> {
        if voter == target {
            return Err(Rejection::SelfVote);
        }
        let table = self.table(game);
        let _lock = table.try_lock().ok_or(Rejection::LockContention)?;
        let session = self.running(&table, game).await?;
        let players = self.store.players(game).await?;
        let active = |user: UserId| players.iter().find(|p| p.user_id == user && p.is_active());
        active(voter).ok_or(Rejection::Ineligible(voter))?;
        let accused = active(target).ok_or(Rejection::UnknownPlayer(target))?;
        let idle = session
            .stamp()
            .filter(|stamp| stamp.owner == target)
            .map(|stamp| now() >= table.turn(stamp, self.timer.roll).deadline)
            .unwrap_or(false);
        if !idle && accused.consecutive_timeouts < self.timer.strikes {
            return Err(Rejection::NotRemovable(target));
        }
        let eligible = players
            .iter()
            .filter(|p| p.is_active() && p.user_id != target)
            .count();
        let required = majority(eligible);
        let (votes, fresh) = table.ballots(|b| b.cast(target, voter));
        log::info!(
            "[arbiter] game {} vote against {} by {} ({}/{})",
            game,
            target,
            voter,
            votes,
            required
        );
        let mut ballot = Ballot {
            target,
            votes,
            required,
            removed: false,
        };
        if votes < required {
            return Ok(ballot);
        }
        match self.remove(&table, &session, &players, accused).await {
            Ok(()) => {
                table.ballots(|b| b.clear(target));
                ballot.removed = true;
                Ok(ballot)
            }
            Err(rejection) => {
                if fresh {
                    table.ballots(|b| b.withdraw(target, voter));
                }
                Err(rejection)
            }
        }
    }

    /// Force-end the game's turn if its window has lapsed.
    pub async fn tick(self: &Arc<Self>, game: GameId) -> Result<Option<Outcome>, Rejection> {
        self.lapse(game, Check::Tick).await
    }

    /// Force-end the turn identified by `stamp` if it is still current and lapsed.
    /// A stamp that no longer matches the store is a stale alarm and does nothing.
    pub async fn expire(
        self: &Arc<Self>,
        game: GameId,
        stamp: Stamp,
    ) -> Result<Option<Outcome>, Rejection> {
        self.lapse(game, Check::Alarm(stamp)).await
    }

    /// Sweep running games forever.
    pub async fn patrol(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.timer.patrol);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let expired = self.sweep().await;
            if expired > 0 {
                log::info!("[patrol] force-ended {} turns", expired);
            }
        }
    }

    /// One pass over running games: expire lapsed turns, re-arm missing
    /// alarms, and restart automated seats. Returns how many turns expired.
    pub async fn sweep(self: &Arc<Self>) -> usize {
        let games = match self.store.running().await {
            Ok(games) => games,
            Err(e) => {
                log::warn!("[patrol] cannot list running games: {}", e);
                return 0;
            }
        };
        let mut expired = 0;
        for game in games {
            match self.lapse(game.id, Check::Sweep).await {
                Ok(Some(_)) => expired += 1,
                Ok(None) => {}
                Err(Rejection::LockContention) | Err(Rejection::NotRunning(_)) => {}
                Err(e) => log::warn!("[patrol] game {}: {}", game.id, e),
            }
        }
        expired
    }

    /// Re-arm a live turn's alarm and restart its pilot.
    /// Called with the lock held and `turn` read for the store's current stamp.
    async fn revive(self: &Arc<Self>, table: &Table, game: GameId, turn: Turn) {
        if table.alarm().armed() != Some(turn.stamp) {
            self.arm(table, game, turn.stamp, turn.deadline);
        }
        if let Ok(players) = self.store.players(game).await {
            if players
                .iter()
                .any(|p| p.user_id == turn.stamp.owner && p.agent && p.is_active())
            {
                self.pilot(table, game, turn.stamp.owner);
            }
        }
    }

    async fn lapse(
        self: &Arc<Self>,
        game: GameId,
        check: Check,
    ) -> Result<Option<Outcome>, Rejection> {
        let table = self.table(game);
        let _lock = table.try_lock().ok_or(Rejection::LockContention)?;
        let session = self.running(&table, game).await?;
        let Some(stamp) = session.stamp() else {
            return Ok(None);
        };
        if let Check::Alarm(expected) = check {
            if expected != stamp {
                log::debug!("[arbiter] game {} ignoring stale alarm", game);
                return Ok(None);
            }
        }
        let turn = table.turn(stamp, self.timer.roll);
        let at = now();
        if at < turn.deadline {
            if check == Check::Sweep {
                self.revive(&table, game, turn).await;
            }
            return Ok(None);
        }
        let players = self.store.players(game).await?;
        let user = stamp.owner;
        let counted = !turn.rolled;
        let passing = Self::pass(&players, user, at);
        let mut effects = Vec::with_capacity(passing.effects.len() + 1);
        if counted {
            effects.push(Effect::Timeout { user });
        }
        effects.extend(passing.effects);
        self.apply(game, &effects).await?;
        let next = passing.heir.map(|heir| heir.stamp.owner);
        log::info!(
            "[arbiter] game {} player {} timed out{}, next {:?}",
            game,
            user,
            if counted { "" } else { " after rolling" },
            next
        );
        self.hand_over(&table, game, passing.heir);
        self.touch(&session.code);
        Ok(Some(Outcome::TimedOut {
            user,
            counted,
            next,
        }))
    }

    async fn ring(self: Arc<Self>, game: GameId, stamp: Stamp) {
        match self.expire(game, stamp).await {
            Ok(_) => {}
            Err(Rejection::LockContention) => self.snooze(game, stamp),
            Err(Rejection::Persistence(e)) => {
                log::warn!("[arbiter] game {} alarm failed: {}", game, e);
                self.snooze(game, stamp);
            }
            Err(e) => log::debug!("[arbiter] game {} alarm dropped: {}", game, e),
        }
    }

    /// Schedule the expiry of `stamp` at `at`, superseding any earlier alarm.
    fn arm(self: &Arc<Self>, table: &Table, game: GameId, stamp: Stamp, at: DateTime<Utc>) {
        let handle = self.alarm(game, stamp, until(at));
        table.alarm().set(stamp, handle);
    }

    fn snooze(self: &Arc<Self>, game: GameId, stamp: Stamp) {
        let handle = self.alarm(game, stamp, self.timer.retry);
        match self.existing(game) {
            Some(table) => {
                table.alarm().retry(stamp, handle);
            }
            None => handle.abort(),
        }
    }

    fn alarm(
        self: &Arc<Self>,
        game: GameId,
        stamp: Stamp,
        wait: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let arbiter = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            if let Some(arbiter) = arbiter.upgrade() {
                arbiter.ring(game, stamp).await;
            }
        })
    }

    async fn perform(
        self: &Arc<Self>,
        table: &Table,
        session: &GameSession,
        players: &[Player],
        player: &Player,
        turn: Turn,
        action: Action,
    ) -> Result<Outcome, Rejection> {
        let plan = self.plan(session, players, player, turn, action).await?;
        self.apply(session.id, &plan.effects).await?;
        match plan.then {
            Then::Stay { phase } => {
                let turn = Turn {
                    phase,
                    rolled: true,
                    deadline: deadline(now(), self.timer.roll),
                    ..turn
                };
                table.record(turn);
                self.arm(table, session.id, turn.stamp, turn.deadline);
            }
            Then::Pass(heir) => {
                table.ballots(|b| b.clear(player.user_id));
                self.hand_over(table, session.id, heir);
            }
        }
        self.touch(&session.code);
        Ok(plan.outcome)
    }

    async fn plan(
        &self,
        session: &GameSession,
        players: &[Player],
        player: &Player,
        turn: Turn,
        action: Action,
    ) -> Result<Plan, Rejection> {
        let user = player.user_id;
        match (action, turn.phase) {
            (Action::Roll, Phase::AwaitingRoll) if !player.in_jail => {
                let dice = self.dice.roll();
                let (to, passed_go) = walk(player.position, dice.0 + dice.1);
                let landing = self.rules.land(session, player, to, passed_go).await?;
                let mut effects = vec![Effect::Move { user, position: to }];
                effects.extend_from_slice(landing.effects());
                let (phase, jailed) = match landing {
                    Landing::Purchasable {
                        property, price, ..
                    } => (Phase::AwaitingBuyDecision { property, price }, false),
                    Landing::GoToJail => {
                        effects.push(Effect::Jail { user });
                        (Phase::TurnEnding, true)
                    }
                    Landing::Settled { .. } => (Phase::TurnEnding, false),
                };
                Ok(Plan {
                    effects,
                    then: Then::Stay { phase },
                    outcome: Outcome::Rolled {
                        dice: [dice.0, dice.1],
                        position: if jailed { JAIL_SQUARE } else { to },
                        jailed,
                        phase,
                    },
                })
            }
            (Action::RollJail, Phase::AwaitingRoll) if player.in_jail => {
                let dice = self.dice.roll();
                let pair = [dice.0, dice.1];
                Ok(match doubles(dice) {
                    true => Plan {
                        effects: vec![Effect::Release { user }],
                        then: Then::Stay {
                            phase: Phase::AwaitingRoll,
                        },
                        outcome: Outcome::Released { dice: pair },
                    },
                    false => Plan {
                        effects: vec![],
                        then: Then::Stay {
                            phase: Phase::JailStay,
                        },
                        outcome: Outcome::Stayed { dice: pair },
                    },
                })
            }
            (Action::Buy, Phase::AwaitingBuyDecision { property, price }) => {
                if player.balance < price {
                    return Err(Rejection::InsufficientBalance {
                        balance: player.balance,
                        price,
                    });
                }
                Ok(Plan {
                    effects: vec![Effect::Purchase {
                        user,
                        property,
                        price,
                    }],
                    then: Then::Stay {
                        phase: Phase::TurnEnding,
                    },
                    outcome: Outcome::Bought { property, price },
                })
            }
            (Action::Skip, Phase::AwaitingBuyDecision { .. }) => Ok(Plan {
                effects: vec![],
                then: Then::Stay {
                    phase: Phase::TurnEnding,
                },
                outcome: Outcome::Skipped,
            }),
            (Action::EndTurn, phase) if phase.can_end() => {
                let passing = Self::pass(players, user, now());
                let mut effects = vec![Effect::Settle { user }];
                effects.extend(passing.effects);
                Ok(Plan {
                    effects,
                    then: Then::Pass(passing.heir),
                    outcome: Outcome::Ended {
                        next: passing.heir.map(|heir| heir.stamp.owner),
                    },
                })
            }
            (action, phase) => Err(Rejection::Illegal { action, phase }),
        }
    }

    async fn remove(
        self: &Arc<Self>,
        table: &Table,
        session: &GameSession,
        players: &[Player],
        accused: &Player,
    ) -> Result<(), Rejection> {
        let target = accused.user_id;
        let mut effects = self.rules.dispose(session, accused).await?;
        effects.push(Effect::Remove { user: target });
        let mut remaining = players.to_vec();
        remaining
            .iter_mut()
            .filter(|p| p.user_id == target)
            .for_each(|p| p.removed = true);
        let survivors = remaining.iter().filter(|p| p.is_active()).count();
        let handover = if survivors < 2 {
            let winner = remaining.iter().find(|p| p.is_active()).map(|p| p.user_id);
            effects.push(Effect::Finish { winner });
            Some(None)
        } else if session.current_turn_player_id == Some(target) {
            let passing = Self::pass(&remaining, target, now());
            effects.extend(passing.effects);
            Some(passing.heir)
        } else {
            None
        };
        self.apply(session.id, &effects).await?;
        log::info!("[arbiter] game {} removed player {}", session.id, target);
        if let Some(heir) = handover {
            self.hand_over(table, session.id, heir);
        }
        self.touch(&session.code);
        Ok(())
    }

    /// Effects that pass the turn on from `leaving`, or finish the game
    /// when nobody else is left to play.
    fn pass(players: &[Player], leaving: UserId, at: DateTime<Utc>) -> Passing {
        match successor(players, leaving) {
            Some(next) => Passing {
                effects: vec![Effect::Advance {
                    next: next.user_id,
                    at,
                }],
                heir: Some(Heir {
                    stamp: Stamp {
                        owner: next.user_id,
                        started: at,
                    },
                    automated: next.agent,
                }),
            },
            None => Passing {
                effects: vec![Effect::Finish {
                    winner: players.iter().find(|p| p.is_active()).map(|p| p.user_id),
                }],
                heir: None,
            },
        }
    }

    fn hand_over(self: &Arc<Self>, table: &Table, game: GameId, heir: Option<Heir>) {
        match heir {
            None => {
                log::info!("[arbiter] game {} finished", game);
                table.close();
                self.tables
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&game);
            }
            Some(heir) => {
                let turn = Turn::fresh(heir.stamp, self.timer.roll);
                table.record(turn);
                self.arm(table, game, turn.stamp, turn.deadline);
                if heir.automated {
                    self.pilot(table, game, heir.stamp.owner);
                }
            }
        }
    }

    /// The game's session if it is running. A game that is unknown or no
    /// longer running has its table dropped so it holds no state here.
    async fn running(&self, table: &Arc<Table>, game: GameId) -> Result<GameSession, Rejection> {
        let rejection = match self.store.game(game).await? {
            Some(session) if session.is_running() => return Ok(session),
            Some(session) => Rejection::NotRunning(session.status),
            None => Rejection::UnknownGame(game),
        };
        self.discard(table, game);
        Err(rejection)
    }

    fn discard(&self, table: &Arc<Table>, game: GameId) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if tables.get(&game).is_some_and(|kept| Arc::ptr_eq(kept, table)) {
            tables.remove(&game);
        }
    }

    async fn apply(&self, game: GameId, effects: &[Effect]) -> Result<(), Rejection> {
        if effects.is_empty() {
            return Ok(());
        }
        self.store.apply(game, effects).await.map_err(|e| {
            log::error!(
                "[arbiter] game {} batch of {} effects failed: {}",
                game,
                effects.len(),
                e
            );
            Rejection::from(e)
        })
    }

    /// Invalidate the viewer cache, then signal the room.
    fn touch(&self, code: &str) {
        self.cache.invalidate(code);
        self.broadcast.publish(code);
    }
}

/// Square reached after `steps` from `from`, and whether GO was passed.
pub fn walk(from: Square, steps: u8) -> (Square, bool) {
    let sum = from as u16 + steps as u16;
    ((sum % BOARD_SIZE as u16) as Square, sum >= BOARD_SIZE as u16)
}
