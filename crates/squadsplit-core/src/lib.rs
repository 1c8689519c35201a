// Library root: the team-balancing engine.
//
// Splits a roster into two equally sized teams with close total scores,
// keeping locked participants on their previous side and steering away from
// the split produced last time for the same pool.

pub mod assign;
pub mod balancer;
pub mod captain;
pub mod equivalence;
pub mod error;
pub mod history;
pub mod model;
pub mod partition;
pub mod shuffle;

pub use balancer::{generate_teams, Balancer};
pub use error::ConfigurationError;
pub use history::{AssignmentHistory, RosterFingerprint};
pub use model::{
    BalanceSettings, GenerationOutcome, Lineup, LockMap, Participant, ParticipantId, Side,
    SplitQuality, Team, TeamPair,
};
