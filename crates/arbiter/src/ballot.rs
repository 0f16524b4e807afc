use serde::Serialize;
use std::collections::BTreeSet;
use std::collections::HashMap;
use tycoon_core::*;

/// Votes to remove, keyed by target. Each voter counts once.
#[derive(Debug, Default)]
pub struct Ballots {
    votes: HashMap<UserId, BTreeSet<UserId>>,
}

impl Ballots {
    /// Record a vote. Returns the tally and whether the vote was new.
    pub fn cast(&mut self, target: UserId, voter: UserId) -> (usize, bool) {
        let voters = self.votes.entry(target).or_default();
        let fresh = voters.insert(voter);
        (voters.len(), fresh)
    }
    pub fn withdraw(&mut self, target: UserId, voter: UserId) {
        if let Some(voters) = self.votes.get_mut(&target) {
            voters.remove(&voter);
            if voters.is_empty() {
                self.votes.remove(&target);
            }
        }
    }
    pub fn tally(&self, target: UserId) -> usize {
        self.votes.get(&target).map(BTreeSet::len).unwrap_or(0)
    }
    pub fn clear(&mut self, target: UserId) {
        self.votes.remove(&target);
    }
    pub fn reset(&mut self) {
        self.votes.clear();
    }
}

/// Votes needed to remove a player, given how many others may vote.
pub fn majority(eligible: usize) -> usize {
    eligible / 2 + 1
}

/// Result of a vote as reported to the voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub target: UserId,
    pub votes: usize,
    pub required: usize,
    pub removed: bool,
}
