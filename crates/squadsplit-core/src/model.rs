// Participants, teams, locks and the derived values the engine works with.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable unique identifier of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId(s.to_string())
    }
}

/// A selectable player. Owned by the calling application; the engine only
/// clones participants into freshly built teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Precomputed skill score, at least 1.
    pub score: u32,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Opaque photo reference (URL or storage key).
    #[serde(default)]
    pub photo: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, score: u32) -> Self {
        Participant {
            id: ParticipantId::new(id),
            name: name.into(),
            score,
            nickname: None,
            photo: None,
        }
    }

    /// Nickname when set, otherwise the full name.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}

/// Which of the two teams a participant sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Ids of participants pinned to the side they were on last generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMap {
    ids: HashSet<ParticipantId>,
}

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already locked.
    pub fn lock(&mut self, id: ParticipantId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the id was locked.
    pub fn unlock(&mut self, id: &ParticipantId) -> bool {
        self.ids.remove(id)
    }

    pub fn is_locked(&self, id: &ParticipantId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Locked ids in sorted order.
    pub fn sorted_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<ParticipantId> for LockMap {
    fn from_iter<I: IntoIterator<Item = ParticipantId>>(iter: I) -> Self {
        LockMap {
            ids: iter.into_iter().collect(),
        }
    }
}

/// An ordered squad. When a captain has been chosen it sits at index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team {
    pub members: Vec<Participant>,
}

impl Team {
    pub fn new(members: Vec<Participant>) -> Self {
        Team { members }
    }

    pub fn total_score(&self) -> u64 {
        self.members.iter().map(|p| u64::from(p.score)).sum()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.members.iter().any(|p| &p.id == id)
    }

    /// Sorted, deduplicated member ids.
    pub fn id_set(&self) -> BTreeSet<ParticipantId> {
        self.members.iter().map(|p| p.id.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Participant> {
        self.members.iter()
    }
}

impl FromIterator<Participant> for Team {
    fn from_iter<I: IntoIterator<Item = Participant>>(iter: I) -> Self {
        Team {
            members: iter.into_iter().collect(),
        }
    }
}

/// Two teams produced by one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPair {
    pub a: Team,
    pub b: Team,
}

impl TeamPair {
    pub fn new(a: Team, b: Team) -> Self {
        TeamPair { a, b }
    }

    /// Absolute difference between the two teams' total scores.
    pub fn diff(&self) -> u64 {
        self.a.total_score().abs_diff(self.b.total_score())
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }

    pub fn team(&self, side: Side) -> &Team {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// The side a participant is on, if any.
    pub fn side_of(&self, id: &ParticipantId) -> Option<Side> {
        if self.a.contains(id) {
            Some(Side::A)
        } else if self.b.contains(id) {
            Some(Side::B)
        } else {
            None
        }
    }
}

/// Tuning knobs for one balancing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSettings {
    /// Acceptable score imbalance between the two teams.
    pub max_diff: u64,
    /// Largest roster that is searched exhaustively.
    pub exhaustive_limit: usize,
    /// Cap on shuffles tried by the randomized search.
    pub max_attempts: usize,
}

impl Default for BalanceSettings {
    fn default() -> Self {
        BalanceSettings {
            max_diff: 5,
            exhaustive_limit: 14,
            max_attempts: 10_000,
        }
    }
}

/// How a produced split relates to the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitQuality {
    WithinTolerance,
    BestEffort,
}

impl SplitQuality {
    pub fn classify(diff: u64, max_diff: u64) -> Self {
        if diff <= max_diff {
            SplitQuality::WithinTolerance
        } else {
            SplitQuality::BestEffort
        }
    }
}

/// A split together with its imbalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    pub teams: TeamPair,
    pub diff: u64,
    pub quality: SplitQuality,
}

impl Lineup {
    pub fn new(teams: TeamPair, max_diff: u64) -> Self {
        let diff = teams.diff();
        Lineup {
            teams,
            diff,
            quality: SplitQuality::classify(diff, max_diff),
        }
    }
}

/// Result of a generation that passed the capacity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Split(Lineup),
    /// Every attempt collided with the split to avoid; nothing was produced.
    NoCandidate,
}

impl GenerationOutcome {
    pub fn lineup(&self) -> Option<&Lineup> {
        match self {
            GenerationOutcome::Split(lineup) => Some(lineup),
            GenerationOutcome::NoCandidate => None,
        }
    }

    pub fn into_lineup(self) -> Option<Lineup> {
        match self {
            GenerationOutcome::Split(lineup) => Some(lineup),
            GenerationOutcome::NoCandidate => None,
        }
    }
}
