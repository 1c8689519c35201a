// Captain selection: the strongest member leads the team.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Participant, Team};

/// Highest-scoring member of `team`, ties broken uniformly at random.
/// `None` for an empty team.
pub fn captain<'a, R: Rng + ?Sized>(team: &'a Team, rng: &mut R) -> Option<&'a Participant> {
    let top = team.iter().map(|p| p.score).max()?;
    let tied: Vec<&Participant> = team.iter().filter(|p| p.score == top).collect();
    tied.choose(rng).copied()
}

/// A copy of `team` with its captain at index 0 and everyone else in their
/// original relative order.
pub fn with_captain_first<R: Rng + ?Sized>(team: &Team, rng: &mut R) -> Team {
    let Some(idx) = captain(team, rng).and_then(|c| team.iter().position(|p| p.id == c.id)) else {
        return team.clone();
    };
    if idx == 0 {
        return team.clone();
    }

    let mut members = team.members.clone();
    let chosen = members.remove(idx);
    members.insert(0, chosen);
    Team::new(members)
}
