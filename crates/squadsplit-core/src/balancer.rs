// Session-scoped entry point that threads history and randomness through
// successive generations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::assign::assign;
use crate::captain::with_captain_first;
use crate::error::ConfigurationError;
use crate::history::AssignmentHistory;
use crate::model::{BalanceSettings, GenerationOutcome, Lineup, LockMap, Participant, TeamPair};

/// Run one generation with every collaborator passed explicitly.
///
/// Assigns the roster (see [`assign`](crate::assign::assign)) and then moves
/// each team's captain to the front.
pub fn generate_teams<R: Rng + ?Sized>(
    roster: &[Participant],
    locks: &LockMap,
    previous: &TeamPair,
    history: &mut AssignmentHistory,
    rng: &mut R,
    settings: &BalanceSettings,
) -> Result<GenerationOutcome, ConfigurationError> {
    let outcome = assign(roster, locks, previous, history, rng, settings)?;
    Ok(match outcome {
        GenerationOutcome::Split(lineup) => {
            let teams = TeamPair::new(
                with_captain_first(&lineup.teams.a, rng),
                with_captain_first(&lineup.teams.b, rng),
            );
            GenerationOutcome::Split(Lineup { teams, ..lineup })
        }
        GenerationOutcome::NoCandidate => GenerationOutcome::NoCandidate,
    })
}

/// Balancing state owned by one calling session: settings, the assignment
/// history and the random source.
#[derive(Debug, Clone)]
pub struct Balancer<R = ChaCha8Rng> {
    settings: BalanceSettings,
    history: AssignmentHistory,
    rng: R,
}

impl Balancer<ChaCha8Rng> {
    /// Deterministic balancer; the same seed and inputs yield the same teams.
    pub fn seeded(settings: BalanceSettings, seed: u64) -> Self {
        Balancer::new(settings, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy(settings: BalanceSettings) -> Self {
        Balancer::new(settings, ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> Balancer<R> {
    pub fn new(settings: BalanceSettings, rng: R) -> Self {
        Balancer {
            settings,
            history: AssignmentHistory::new(),
            rng,
        }
    }

    /// Replace the history, e.g. with one restored from storage.
    pub fn with_history(mut self, history: AssignmentHistory) -> Self {
        self.history = history;
        self
    }

    pub fn settings(&self) -> &BalanceSettings {
        &self.settings
    }

    pub fn history(&self) -> &AssignmentHistory {
        &self.history
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    pub fn generate(
        &mut self,
        roster: &[Participant],
        locks: &LockMap,
        previous: &TeamPair,
    ) -> Result<GenerationOutcome, ConfigurationError> {
        let outcome = generate_teams(
            roster,
            locks,
            previous,
            &mut self.history,
            &mut self.rng,
            &self.settings,
        )?;
        if let GenerationOutcome::Split(lineup) = &outcome {
            info!(
                team_a = lineup.teams.a.len(),
                team_b = lineup.teams.b.len(),
                diff = lineup.diff,
                quality = ?lineup.quality,
                "teams generated"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::same_split;
    use crate::model::{ParticipantId, Side, SplitQuality};

    fn roster(scores: &[u32]) -> Vec<Participant> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| Participant::new(format!("p{}", i + 1), format!("Player {}", i + 1), s))
            .collect()
    }

    #[test]
    fn captains_lead_both_teams() {
        let players = roster(&[7, 3, 9, 2, 6, 4]);
        let mut balancer = Balancer::seeded(BalanceSettings::default(), 21);
        let lineup = balancer
            .generate(&players, &LockMap::new(), &TeamPair::default())
            .unwrap()
            .into_lineup()
            .unwrap();
        for team in [&lineup.teams.a, &lineup.teams.b] {
            let top = team.iter().map(|p| p.score).max().unwrap();
            assert_eq!(team.members[0].score, top);
        }
    }

    #[test]
    fn same_seed_same_teams() {
        let players = roster(&[7, 3, 9, 2, 6, 4, 8, 5]);
        let run = |seed| {
            Balancer::seeded(BalanceSettings::default(), seed)
                .generate(&players, &LockMap::new(), &TeamPair::default())
                .unwrap()
        };
        assert_eq!(run(4), run(4));
    }

    #[test]
    fn consecutive_generations_do_not_repeat() {
        let players = roster(&[5, 5, 4, 4, 3, 3]);
        let mut balancer = Balancer::seeded(BalanceSettings::default(), 2);
        let mut previous = TeamPair::default();
        for _ in 0..10 {
            let lineup = balancer
                .generate(&players, &LockMap::new(), &previous)
                .unwrap()
                .into_lineup()
                .unwrap();
            assert!(!same_split(&lineup.teams, &previous));
            assert_eq!(lineup.quality, SplitQuality::WithinTolerance);
            previous = lineup.teams;
        }
        assert_eq!(balancer.history().len(), 1);
    }

    #[test]
    fn capacity_error_surfaces_through_balancer() {
        let players = roster(&[1, 2, 3, 4]);
        let previous = TeamPair::new(
            players[..1].iter().cloned().collect(),
            players[1..].iter().cloned().collect(),
        );
        let locks: LockMap = ["p2", "p3", "p4"].into_iter().map(ParticipantId::new).collect();
        let mut balancer = Balancer::seeded(BalanceSettings::default(), 0);
        let err = balancer.generate(&players, &locks, &previous).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::LockedOverCapacity { side: Side::B, locked: 3, capacity: 2 }
        ));
        assert!(balancer.history().is_empty());
    }
}
