// Balanced two-way partition search.
//
// Small pools are enumerated exhaustively and a split is drawn at random from
// every candidate within tolerance. Larger pools are sampled by repeated
// shuffling with an early exit once a split is good enough.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::equivalence::same_split;
use crate::history::{AssignmentHistory, RosterFingerprint};
use crate::model::{BalanceSettings, GenerationOutcome, Lineup, Participant, Team, TeamPair};
use crate::shuffle::shuffled;

/// Partition search configured by a set of [`BalanceSettings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionSearch {
    settings: BalanceSettings,
}

impl PartitionSearch {
    pub fn new(settings: BalanceSettings) -> Self {
        PartitionSearch { settings }
    }

    pub fn settings(&self) -> &BalanceSettings {
        &self.settings
    }

    /// Split `participants` into teams of `ceil(n/2)` and `floor(n/2)`.
    ///
    /// Candidates equivalent to the split last recorded for `fingerprint`, or
    /// to `previous`, are rejected. The produced split replaces the history
    /// entry for `fingerprint`. Returns [`GenerationOutcome::NoCandidate`]
    /// only when the randomized search rejected every attempt; history is
    /// left untouched in that case.
    pub fn run<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        fingerprint: RosterFingerprint,
        previous: Option<&TeamPair>,
        history: &mut AssignmentHistory,
        rng: &mut R,
    ) -> GenerationOutcome {
        let cached = history.last(&fingerprint).cloned();
        let avoid: Vec<&TeamPair> = cached
            .iter()
            .chain(previous.filter(|p| !p.is_empty()))
            .collect();

        let chosen = if participants.len() > self.settings.exhaustive_limit {
            self.randomized(participants, &avoid, rng)
        } else {
            Some(self.exhaustive(participants, &avoid, rng))
        };

        match chosen {
            Some(teams) => {
                history.record(fingerprint, teams.clone());
                GenerationOutcome::Split(Lineup::new(teams, self.settings.max_diff))
            }
            None => {
                warn!(
                    pool = participants.len(),
                    attempts = self.settings.max_attempts,
                    "randomized search found no split that differs from the previous one"
                );
                GenerationOutcome::NoCandidate
            }
        }
    }

    fn randomized<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        avoid: &[&TeamPair],
        rng: &mut R,
    ) -> Option<TeamPair> {
        let mut best: Option<(TeamPair, u64)> = None;

        for attempt in 0..self.settings.max_attempts {
            let candidate = halves(&shuffled(participants, rng));
            if is_repeat(&candidate, avoid) {
                continue;
            }

            let diff = candidate.diff();
            if best.as_ref().map_or(true, |(_, best_diff)| diff < *best_diff) {
                best = Some((candidate, diff));
            }
            if diff <= self.settings.max_diff {
                debug!(attempt, diff, "randomized search reached tolerance");
                break;
            }
        }

        if let Some((_, diff)) = &best {
            debug!(pool = participants.len(), diff, "randomized search finished");
        }
        best.map(|(teams, _)| teams)
    }

    fn exhaustive<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        avoid: &[&TeamPair],
        rng: &mut R,
    ) -> TeamPair {
        let n = participants.len();
        let mut pool: Vec<TeamPair> = Vec::new();
        let mut min_diff: Option<u64> = None;

        for chosen in Combinations::new(n, n.div_ceil(2)) {
            let candidate = split_by_indices(participants, &chosen);
            if is_repeat(&candidate, avoid) {
                continue;
            }
            let diff = candidate.diff();
            min_diff = Some(min_diff.map_or(diff, |m| m.min(diff)));
            if diff <= self.settings.max_diff {
                pool.push(candidate);
            }
        }

        debug!(
            pool = n,
            candidates = pool.len(),
            min_diff = ?min_diff,
            "exhaustive search finished"
        );

        // Any split within tolerance is equally eligible.
        match pool.choose(rng) {
            Some(teams) => teams.clone(),
            None => {
                debug!(pool = n, "no split within tolerance; falling back to a random split");
                halves(&shuffled(participants, rng))
            }
        }
    }
}

fn is_repeat(candidate: &TeamPair, avoid: &[&TeamPair]) -> bool {
    avoid.iter().any(|prev| same_split(candidate, prev))
}

/// First `ceil(n/2)` entries to A, the rest to B.
fn halves(order: &[Participant]) -> TeamPair {
    let (a, b) = order.split_at(order.len().div_ceil(2));
    TeamPair::new(Team::new(a.to_vec()), Team::new(b.to_vec()))
}

/// `chosen` holds sorted indices of the members of team A.
fn split_by_indices(participants: &[Participant], chosen: &[usize]) -> TeamPair {
    let mut a = Vec::with_capacity(chosen.len());
    let mut b = Vec::with_capacity(participants.len() - chosen.len());
    let mut next = chosen.iter().peekable();
    for (i, p) in participants.iter().enumerate() {
        if next.peek() == Some(&&i) {
            next.next();
            a.push(p.clone());
        } else {
            b.push(p.clone());
        }
    }
    TeamPair::new(Team::new(a), Team::new(b))
}

/// Lexicographic k-subsets of `0..n`, as sorted index vectors.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Combinations {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        let k = self.indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}
