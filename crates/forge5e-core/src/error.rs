//! Error taxonomy shared by the deriver and the planner.

use thiserror::Error;

use crate::rules::LookupError;

/// Errors surfaced by [`crate::derive_character`] and
/// [`crate::plan_progression`].
///
/// All derivation math is total, so there is no computation variant.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Malformed caller input. The message names the violated constraint.
    #[error("{0}")]
    Validation(String),

    /// A required rules document could not be retrieved.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ForgeError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
