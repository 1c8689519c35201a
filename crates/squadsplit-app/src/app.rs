// Session orchestration.
//
// Ties the roster, the stored session state and the balancing engine
// together: restores locks and assignment history from the database, enforces
// the selection rules the engine expects from its caller, and persists each
// successful generation.

use std::collections::HashSet;

use squadsplit_core::{
    Balancer, ConfigurationError, Lineup, LockMap, Participant, ParticipantId, Side, Team,
    TeamPair,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Database, StoredGeneration};
use crate::roster::{self, RosterError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("select at least 2 participants, got {count}")]
    TooFewParticipants { count: usize },

    #[error("select an even number of participants, got {count}")]
    OddSelection { count: usize },

    #[error("participant '{id}' is not on either team of the last generation")]
    NotInLastGeneration { id: ParticipantId },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("no split could be found that differs from the previous one; try again")]
    NoCandidate,

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One group's balancing session: roster, locks, engine state and storage.
pub struct Session {
    config: Config,
    roster: Vec<Participant>,
    db: Database,
    balancer: Balancer,
    locks: LockMap,
}

impl Session {
    /// Build a session, restoring locks and assignment history from `db`.
    pub fn open(config: Config, roster: Vec<Participant>, db: Database) -> Result<Self, SessionError> {
        let history = db.load_history()?;
        let locks = db.load_locks()?;
        info!(
            "Session restored: {} participants, {} locks, {} remembered pools",
            roster.len(),
            locks.len(),
            history.len()
        );

        let balancer = match config.seed {
            Some(seed) => Balancer::seeded(config.balance, seed),
            None => Balancer::from_entropy(config.balance),
        }
        .with_history(history);

        Ok(Session {
            config,
            roster,
            db,
            balancer,
            locks,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn locks(&self) -> &LockMap {
        &self.locks
    }

    /// The last stored generation with members resolved against the roster.
    pub fn current(&self) -> Result<Option<Lineup>, SessionError> {
        let Some(stored) = self.db.last_generation()? else {
            return Ok(None);
        };
        Ok(Some(self.resolve(stored)))
    }

    /// Generate new teams from the selected ids (the whole roster when
    /// `selection` is empty).
    ///
    /// Nothing is persisted unless the engine produces a split.
    pub fn generate(&mut self, selection: &[ParticipantId]) -> Result<Lineup, SessionError> {
        let selected = roster::select(&self.roster, selection)?;
        let count = selected.iter().map(|p| &p.id).collect::<HashSet<_>>().len();
        if count < 2 {
            return Err(SessionError::TooFewParticipants { count });
        }
        if count % 2 != 0 {
            return Err(SessionError::OddSelection { count });
        }

        let previous = self.current()?.map(|l| l.teams).unwrap_or_default();
        let lineup = self
            .balancer
            .generate(&selected, &self.locks, &previous)?
            .into_lineup()
            .ok_or(SessionError::NoCandidate)?;

        let generation_id = self.db.record_generation(
            &member_ids(&lineup.teams.a),
            &member_ids(&lineup.teams.b),
            lineup.diff,
            lineup.quality,
        )?;
        self.db.save_history(self.balancer.history())?;

        info!(
            "Generation {} stored: {} vs {} participants, diff {}",
            generation_id,
            lineup.teams.a.len(),
            lineup.teams.b.len(),
            lineup.diff
        );
        Ok(lineup)
    }

    /// Pin a participant to the side they hold in the last generation.
    pub fn lock(&mut self, id: &ParticipantId) -> Result<Side, SessionError> {
        let side = self
            .current()?
            .and_then(|l| l.teams.side_of(id))
            .ok_or_else(|| SessionError::NotInLastGeneration { id: id.clone() })?;
        if self.locks.lock(id.clone()) {
            self.db.save_locks(&self.locks)?;
            info!("Locked {} on team {}", id, side);
        }
        Ok(side)
    }

    /// Returns `true` if the participant was locked.
    pub fn unlock(&mut self, id: &ParticipantId) -> Result<bool, SessionError> {
        let removed = self.locks.unlock(id);
        if removed {
            self.db.save_locks(&self.locks)?;
            info!("Unlocked {}", id);
        }
        Ok(removed)
    }

    pub fn clear_locks(&mut self) -> Result<(), SessionError> {
        self.locks.clear();
        self.db.save_locks(&self.locks)?;
        Ok(())
    }

    /// Forget all generations, locks and history.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.db.clear_session()?;
        self.locks.clear();
        self.balancer.reset_history();
        info!("Session reset");
        Ok(())
    }

    fn resolve(&self, stored: StoredGeneration) -> Lineup {
        let team = |ids: &[ParticipantId]| -> Team {
            ids.iter()
                .filter_map(|id| {
                    let found = roster::find(&self.roster, id).cloned();
                    if found.is_none() {
                        warn!("participant '{}' from generation {} is no longer on the roster", id, stored.id);
                    }
                    found
                })
                .collect()
        };
        Lineup {
            teams: TeamPair::new(team(&stored.team_a), team(&stored.team_b)),
            diff: stored.diff,
            quality: stored.quality,
        }
    }
}

fn member_ids(team: &Team) -> Vec<ParticipantId> {
    team.iter().map(|p| p.id.clone()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
