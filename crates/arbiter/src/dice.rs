use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Source of dice rolls.
pub trait Dice: Send + Sync {
    fn roll(&self) -> (u8, u8);
}

/// Two fair six-sided dice.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fair;

impl Dice for Fair {
    fn roll(&self) -> (u8, u8) {
        let mut rng = rand::rng();
        (rng.random_range(1..=6), rng.random_range(1..=6))
    }
}

/// Replays a fixed sequence of rolls, then repeats the last one.
/// Used for scripted games.
#[derive(Debug, Default)]
pub struct Loaded {
    rolls: Mutex<VecDeque<(u8, u8)>>,
    last: Mutex<Option<(u8, u8)>>,
}

impl Loaded {
    pub fn new<I>(rolls: I) -> Self
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        Self {
            rolls: Mutex::new(rolls.into_iter().collect()),
            last: Mutex::new(None),
        }
    }
}

impl Dice for Loaded {
    fn roll(&self) -> (u8, u8) {
        let next = self
            .rolls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let roll = next.or(*last).unwrap_or((1, 2));
        *last = Some(roll);
        roll
    }
}

pub fn doubles(roll: (u8, u8)) -> bool {
    roll.0 == roll.1
}
