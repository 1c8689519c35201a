// SQLite persistence for generated teams and session state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use squadsplit_core::{AssignmentHistory, LockMap, ParticipantId, SplitQuality};

/// A generation as stored: team membership by id, in team order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGeneration {
    pub id: i64,
    pub team_a: Vec<ParticipantId>,
    pub team_b: Vec<ParticipantId>,
    pub diff: u64,
    pub quality: SplitQuality,
    pub created_at: String,
}

/// SQLite-backed persistence for generations and key-value session state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    const LOCKS_KEY: &'static str = "locks";
    const HISTORY_KEY: &'static str = "assignment_history";

    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS generations (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                team_a     TEXT NOT NULL,
                team_b     TEXT NOT NULL,
                diff       INTEGER NOT NULL,
                quality    TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS session_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Generations
    // ------------------------------------------------------------------

    /// Append a generation and return its row id.
    pub fn record_generation(
        &self,
        team_a: &[ParticipantId],
        team_b: &[ParticipantId],
        diff: u64,
        quality: SplitQuality,
    ) -> Result<i64> {
        let conn = self.conn();
        let team_a_json = serde_json::to_string(team_a).context("failed to serialize team A")?;
        let team_b_json = serde_json::to_string(team_b).context("failed to serialize team B")?;
        let quality_json =
            serde_json::to_string(&quality).context("failed to serialize split quality")?;
        let diff = i64::try_from(diff).context("score difference out of range")?;
        let created_at = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO generations (team_a, team_b, diff, quality, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![team_a_json, team_b_json, diff, quality_json, created_at],
        )
        .context("failed to record generation")?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recently recorded generation, if any.
    pub fn last_generation(&self) -> Result<Option<StoredGeneration>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, team_a, team_b, diff, quality, created_at
                 FROM generations ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .context("failed to query last generation")?;

        let Some((id, team_a, team_b, diff, quality, created_at)) = row else {
            return Ok(None);
        };

        Ok(Some(StoredGeneration {
            id,
            team_a: serde_json::from_str(&team_a).context("failed to deserialize team A")?,
            team_b: serde_json::from_str(&team_b).context("failed to deserialize team B")?,
            diff: u64::try_from(diff).context("stored score difference is negative")?,
            quality: serde_json::from_str(&quality).context("failed to deserialize quality")?,
            created_at,
        }))
    }

    pub fn generation_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM generations", [], |row| row.get(0))
            .context("failed to count generations")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Key-value session state
    // ------------------------------------------------------------------

    /// Persist a serializable value under `key`, replacing any previous value.
    pub fn save_state<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query session state")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    pub fn save_locks(&self, locks: &LockMap) -> Result<()> {
        self.save_state(Self::LOCKS_KEY, locks)
    }

    pub fn load_locks(&self) -> Result<LockMap> {
        Ok(self.load_state(Self::LOCKS_KEY)?.unwrap_or_default())
    }

    pub fn save_history(&self, history: &AssignmentHistory) -> Result<()> {
        self.save_state(Self::HISTORY_KEY, history)
    }

    pub fn load_history(&self) -> Result<AssignmentHistory> {
        Ok(self.load_state(Self::HISTORY_KEY)?.unwrap_or_default())
    }

    /// Delete all generations and session state in one transaction.
    pub fn clear_session(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM generations", [])
            .context("failed to delete generations")?;
        tx.execute("DELETE FROM session_state", [])
            .context("failed to delete session state")?;
        tx.commit().context("failed to commit clear_session")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadsplit_core::{Participant, RosterFingerprint, Team, TeamPair};

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn ids(raw: &[&str]) -> Vec<ParticipantId> {
        raw.iter().map(|id| ParticipantId::new(*id)).collect()
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"generations".to_string()));
        assert!(tables.contains(&"session_state".to_string()));
    }

    #[test]
    fn empty_database_has_no_generation() {
        let db = test_db();
        assert!(db.last_generation().unwrap().is_none());
        assert_eq!(db.generation_count().unwrap(), 0);
    }

    #[test]
    fn last_generation_returns_newest() {
        let db = test_db();
        db.record_generation(&ids(&["p1", "p2"]), &ids(&["p3", "p4"]), 2, SplitQuality::WithinTolerance)
            .unwrap();
        let second = db
            .record_generation(&ids(&["p3", "p1"]), &ids(&["p2", "p4"]), 9, SplitQuality::BestEffort)
            .unwrap();

        let last = db.last_generation().unwrap().unwrap();
        assert_eq!(last.id, second);
        assert_eq!(last.team_a, ids(&["p3", "p1"]));
        assert_eq!(last.team_b, ids(&["p2", "p4"]));
        assert_eq!(last.diff, 9);
        assert_eq!(last.quality, SplitQuality::BestEffort);
        assert!(chrono::DateTime::parse_from_rfc3339(&last.created_at).is_ok());
        assert_eq!(db.generation_count().unwrap(), 2);
    }

    #[test]
    fn locks_default_to_empty_and_persist() {
        let db = test_db();
        assert!(db.load_locks().unwrap().is_empty());

        let locks: LockMap = ids(&["p2", "p7"]).into_iter().collect();
        db.save_locks(&locks).unwrap();
        assert_eq!(db.load_locks().unwrap(), locks);
    }

    #[test]
    fn history_persists() {
        let db = test_db();
        let pool = vec![Participant::new("a", "A", 3), Participant::new("b", "B", 4)];
        let mut history = AssignmentHistory::new();
        history.record(
            RosterFingerprint::of(&pool),
            TeamPair::new(Team::new(vec![pool[0].clone()]), Team::new(vec![pool[1].clone()])),
        );
        db.save_history(&history).unwrap();
        assert_eq!(db.load_history().unwrap(), history);
    }

    #[test]
    fn save_state_overwrites() {
        let db = test_db();
        db.save_state("k", &1u32).unwrap();
        db.save_state("k", &2u32).unwrap();
        assert_eq!(db.load_state::<u32>("k").unwrap(), Some(2));
        assert_eq!(db.load_state::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn clear_session_removes_everything() {
        let db = test_db();
        db.record_generation(&ids(&["p1"]), &ids(&["p2"]), 0, SplitQuality::WithinTolerance)
            .unwrap();
        db.save_locks(&ids(&["p1"]).into_iter().collect()).unwrap();

        db.clear_session().unwrap();

        assert!(db.last_generation().unwrap().is_none());
        assert!(db.load_locks().unwrap().is_empty());
    }
}
