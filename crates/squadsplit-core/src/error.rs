// Engine error types.

use thiserror::Error;

use crate::model::Side;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error(
        "more locked participants than available slots on team {side}: \
         {locked} locked, {capacity} slots"
    )]
    LockedOverCapacity {
        side: Side,
        locked: usize,
        capacity: usize,
    },
}
