// Memory of the last split produced for each participant pool.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Participant, ParticipantId, TeamPair};

/// Canonical key for a pool of participants: the sorted ids joined by `,`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterFingerprint(String);

impl RosterFingerprint {
    pub fn from_ids<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a ParticipantId>,
    {
        let mut ids: Vec<&str> = ids.into_iter().map(ParticipantId::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        RosterFingerprint(ids.join(","))
    }

    pub fn of(participants: &[Participant]) -> Self {
        Self::from_ids(participants.iter().map(|p| &p.id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RosterFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last split per fingerprint. Owned by the caller and threaded through
/// successive generations; one entry per fingerprint, overwritten on each
/// new computation for that pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentHistory {
    entries: HashMap<RosterFingerprint, TeamPair>,
}

impl AssignmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self, fingerprint: &RosterFingerprint) -> Option<&TeamPair> {
        self.entries.get(fingerprint)
    }

    /// Store `teams` as the latest split for `fingerprint`, returning the
    /// entry it replaced.
    pub fn record(&mut self, fingerprint: RosterFingerprint, teams: TeamPair) -> Option<TeamPair> {
        self.entries.insert(fingerprint, teams)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
