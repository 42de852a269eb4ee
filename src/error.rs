use crate::models::{ItemId, UserId};
use thiserror::Error;

/// Failures raised by the recommendation core.
///
/// Cold-start seen-items and zero-candidate recommendations are normal
/// results and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecError {
    #[error("duplicate rating for user {user_id} and item {item_id}")]
    DuplicateRating { user_id: UserId, item_id: ItemId },

    #[error("user {0} is not in the similarity scope")]
    UnknownUser(UserId),

    #[error("no ratings to build an interaction matrix from")]
    EmptyInput,

    #[error("matrix shape mismatch: expected {expected:?}, found {found:?}")]
    InvalidShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

pub type RecResult<T> = std::result::Result<T, RecError>;
