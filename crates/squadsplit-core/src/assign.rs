// Lock-aware team assignment.

use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::ConfigurationError;
use crate::history::{AssignmentHistory, RosterFingerprint};
use crate::model::{
    BalanceSettings, GenerationOutcome, Lineup, LockMap, Participant, ParticipantId, Side, Team,
    TeamPair,
};
use crate::partition::PartitionSearch;
use crate::shuffle::shuffled;

/// Split `roster` into two teams, keeping locked participants on the side
/// they occupied in `previous`.
///
/// Without locks and with an even pool the whole roster goes through
/// [`PartitionSearch`]. Otherwise the free participants are shuffled and
/// used to fill the remaining slots on each side.
///
/// Fails without touching `history` when a side has more locked members
/// than slots.
pub fn assign<R: Rng + ?Sized>(
    roster: &[Participant],
    locks: &LockMap,
    previous: &TeamPair,
    history: &mut AssignmentHistory,
    rng: &mut R,
    settings: &BalanceSettings,
) -> Result<GenerationOutcome, ConfigurationError> {
    let roster = dedup_by_id(roster);
    let in_roster: HashSet<&ParticipantId> = roster.iter().map(|p| &p.id).collect();

    let mut locked_ids: HashSet<ParticipantId> = HashSet::new();
    let mut pinned = |team: &Team| -> Vec<Participant> {
        team.iter()
            .filter(|p| locks.is_locked(&p.id) && in_roster.contains(&p.id))
            .filter(|p| locked_ids.insert(p.id.clone()))
            .cloned()
            .collect()
    };
    let locked_a = pinned(&previous.a);
    let locked_b = pinned(&previous.b);

    let remaining: Vec<Participant> = roster
        .iter()
        .filter(|p| !locked_ids.contains(&p.id))
        .cloned()
        .collect();

    let total = locked_a.len() + locked_b.len() + remaining.len();
    let size_a = total.div_ceil(2);
    let size_b = total - size_a;

    check_capacity(Side::A, locked_a.len(), size_a)?;
    check_capacity(Side::B, locked_b.len(), size_b)?;

    if locked_ids.is_empty() && remaining.len() % 2 == 0 {
        let fingerprint = RosterFingerprint::of(&remaining);
        return Ok(PartitionSearch::new(*settings).run(
            &remaining,
            fingerprint,
            Some(previous),
            history,
            rng,
        ));
    }

    debug!(
        locked_a = locked_a.len(),
        locked_b = locked_b.len(),
        free = remaining.len(),
        "filling teams around locked participants"
    );

    let needed_a = size_a - locked_a.len();
    let mut pool = shuffled(&remaining, rng).into_iter();

    let mut a = locked_a;
    a.extend(pool.by_ref().take(needed_a));
    let mut b = locked_b;
    b.extend(pool.by_ref().take(size_b.saturating_sub(b.len())));

    for p in pool {
        if a.len() < size_a {
            a.push(p);
        } else {
            b.push(p);
        }
    }

    let teams = TeamPair::new(Team::new(a), Team::new(b));
    Ok(GenerationOutcome::Split(Lineup::new(teams, settings.max_diff)))
}

fn check_capacity(side: Side, locked: usize, capacity: usize) -> Result<(), ConfigurationError> {
    if locked > capacity {
        warn!(%side, locked, capacity, "too many locked participants");
        return Err(ConfigurationError::LockedOverCapacity {
            side,
            locked,
            capacity,
        });
    }
    Ok(())
}

/// Drop later entries that repeat an earlier id.
fn dedup_by_id(roster: &[Participant]) -> Vec<Participant> {
    let mut seen: HashSet<&ParticipantId> = HashSet::new();
    roster
        .iter()
        .filter(|p| seen.insert(&p.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn roster(scores: &[u32]) -> Vec<Participant> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| Participant::new(format!("p{}", i + 1), format!("Player {}", i + 1), s))
            .collect()
    }

    fn pick(players: &[Participant], idx: &[usize]) -> Team {
        idx.iter().map(|&i| players[i].clone()).collect()
    }

    fn locks(ids: &[&str]) -> LockMap {
        ids.iter().map(|id| ParticipantId::new(*id)).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut players = roster(&[5, 6]);
        let mut dup = players[0].clone();
        dup.score = 99;
        players.push(dup);
        let out = dedup_by_id(&players);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].score, 5);
    }

    #[test]
    fn duplicated_roster_entries_are_split_once() {
        let mut players = roster(&[5, 6, 7, 8]);
        players.push(players[1].clone());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut history = AssignmentHistory::new();
        let outcome = assign(
            &players,
            &LockMap::new(),
            &TeamPair::default(),
            &mut history,
            &mut rng,
            &BalanceSettings::default(),
        )
        .unwrap();
        let lineup = outcome.into_lineup().unwrap();
        assert_eq!(lineup.teams.a.len() + lineup.teams.b.len(), 4);
    }

    #[test]
    fn locked_participants_stay_on_their_side() {
        let players = roster(&[9, 8, 7, 6, 5, 4]);
        let previous = TeamPair::new(pick(&players, &[0, 1, 2]), pick(&players, &[3, 4, 5]));
        let lock_map = locks(&["p1", "p4", "p5"]);

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut history = AssignmentHistory::new();
            let lineup = assign(
                &players,
                &lock_map,
                &previous,
                &mut history,
                &mut rng,
                &BalanceSettings::default(),
            )
            .unwrap()
            .into_lineup()
            .unwrap();

            assert!(lineup.teams.a.contains(&"p1".into()));
            assert!(lineup.teams.b.contains(&"p4".into()));
            assert!(lineup.teams.b.contains(&"p5".into()));
            assert_eq!(lineup.teams.a.len(), 3);
            assert_eq!(lineup.teams.b.len(), 3);
            // Locked members lead their side before the free fill.
            assert_eq!(lineup.teams.a.members[0].id, ParticipantId::new("p1"));
        }
    }

    #[test]
    fn locked_path_leaves_history_alone() {
        let players = roster(&[3, 3, 3, 3]);
        let previous = TeamPair::new(pick(&players, &[0, 1]), pick(&players, &[2, 3]));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut history = AssignmentHistory::new();
        assign(
            &players,
            &locks(&["p1"]),
            &previous,
            &mut history,
            &mut rng,
            &BalanceSettings::default(),
        )
        .unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn over_capacity_is_rejected() {
        let players = roster(&[1, 2, 3, 4]);
        let previous = TeamPair::new(pick(&players, &[0, 1, 2]), pick(&players, &[3]));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut history = AssignmentHistory::new();
        let err = assign(
            &players,
            &locks(&["p1", "p2", "p3"]),
            &previous,
            &mut history,
            &mut rng,
            &BalanceSettings::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::LockedOverCapacity {
                side: Side::A,
                locked: 3,
                capacity: 2,
            }
        );
        assert!(history.is_empty());
    }

    #[test]
    fn locks_for_absent_participants_are_ignored() {
        let players = roster(&[4, 4, 4, 4]);
        let mut previous_roster = players.clone();
        previous_roster.push(Participant::new("gone", "Gone", 9));
        let previous = TeamPair::new(
            Team::new(vec![previous_roster[4].clone(), players[0].clone()]),
            pick(&players, &[1, 2, 3]),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut history = AssignmentHistory::new();
        let lineup = assign(
            &players,
            &locks(&["gone"]),
            &previous,
            &mut history,
            &mut rng,
            &BalanceSettings::default(),
        )
        .unwrap()
        .into_lineup()
        .unwrap();
        assert!(!lineup.teams.a.contains(&"gone".into()));
        assert!(!lineup.teams.b.contains(&"gone".into()));
        assert_eq!(lineup.teams.a.len() + lineup.teams.b.len(), 4);
        // No effective locks, so the search path recorded history.
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn odd_roster_gives_extra_member_to_a() {
        let players = roster(&[5, 5, 5, 5, 5]);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut history = AssignmentHistory::new();
        let lineup = assign(
            &players,
            &LockMap::new(),
            &TeamPair::default(),
            &mut history,
            &mut rng,
            &BalanceSettings::default(),
        )
        .unwrap()
        .into_lineup()
        .unwrap();
        assert_eq!(lineup.teams.a.len(), 3);
        assert_eq!(lineup.teams.b.len(), 2);
    }

    #[test]
    fn no_locks_delegates_to_search() {
        let players = roster(&[10, 10, 1, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut history = AssignmentHistory::new();
        let lineup = assign(
            &players,
            &LockMap::new(),
            &TeamPair::default(),
            &mut history,
            &mut rng,
            &BalanceSettings::default(),
        )
        .unwrap()
        .into_lineup()
        .unwrap();
        assert_eq!(lineup.diff, 0);
        assert_eq!(
            history.last(&RosterFingerprint::of(&players)),
            Some(&lineup.teams)
        );
    }
}
