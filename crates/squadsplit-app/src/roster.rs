// Roster import from CSV and per-generation selection.
//
// Expected header: id,name,score,nickname,photo. Nickname and photo may be
// empty; unknown columns are ignored.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use squadsplit_core::{Participant, ParticipantId};
use tracing::warn;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawParticipant {
    id: String,
    name: String,
    score: i64,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    photo: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Columns every roster file must have.
const REQUIRED_COLUMNS: [&str; 3] = ["id", "name", "score"];

/// Parse participants from CSV. Malformed rows and rows with a score below 1
/// are skipped with a warning; a missing column or a repeated id is an error.
fn load_from_reader<R: Read>(rdr: R, source_name: &str) -> Result<Vec<Participant>, RosterError> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers().map_err(|e| RosterError::Csv {
        path: source_name.to_string(),
        source: e,
    })?;
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(RosterError::Validation(format!(
                "{source_name}: missing column '{column}'"
            )));
        }
    }

    let mut participants: Vec<Participant> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for result in reader.deserialize::<RawParticipant>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
                continue;
            }
        };

        let id = raw.id.trim().to_string();
        let name = raw.name.trim().to_string();
        if id.is_empty() || name.is_empty() {
            warn!("skipping roster row with empty id or name");
            continue;
        }
        let score = match u32::try_from(raw.score) {
            Ok(score) if score >= 1 => score,
            _ => {
                warn!("skipping '{}': score {} is below 1", id, raw.score);
                continue;
            }
        };
        if !seen.insert(id.clone()) {
            return Err(RosterError::Validation(format!(
                "participant id '{id}' appears more than once"
            )));
        }

        participants.push(Participant {
            id: ParticipantId::new(id),
            name,
            score,
            nickname: non_blank(raw.nickname),
            photo: non_blank(raw.photo),
        });
    }

    Ok(participants)
}

/// Load the full roster from a CSV file.
pub fn load_roster(path: &Path) -> Result<Vec<Participant>, RosterError> {
    let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_from_reader(file, &path.display().to_string())
}

/// Pick the participants for one generation, in the order given.
/// An empty `ids` selects the whole roster.
pub fn select(roster: &[Participant], ids: &[ParticipantId]) -> Result<Vec<Participant>, RosterError> {
    if ids.is_empty() {
        return Ok(roster.to_vec());
    }
    ids.iter()
        .map(|id| {
            roster
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| RosterError::Validation(format!("unknown participant id '{id}'")))
        })
        .collect()
}

/// Look up a single participant by id.
pub fn find<'a>(roster: &'a [Participant], id: &ParticipantId) -> Option<&'a Participant> {
    roster.iter().find(|p| &p.id == id)
}
